//! Playback controller
//!
//! Pairs the playback surface with its loop enforcer. Both the remote
//! command channel and the browser player view drive playback through this
//! type, so loads and loop changes always stay consistent.

use crate::command::check_position;
use crate::{
    LoopEnforcer, LoopWindow, MediaBackend, MediaEvent, PlaybackCommand, PlaybackSurface, Result,
};
use tracing::debug;

/// Surface plus loop enforcement
pub struct PlaybackController<B: MediaBackend> {
    surface: PlaybackSurface<B>,
    enforcer: LoopEnforcer,
}

impl<B: MediaBackend> PlaybackController<B> {
    /// Create a controller over a backend
    pub fn new(backend: B) -> Self {
        Self {
            surface: PlaybackSurface::new(backend),
            enforcer: LoopEnforcer::new(),
        }
    }

    /// Apply a remote command.
    ///
    /// Errors describe a rejected command; the current playback is untouched.
    pub fn apply(&mut self, command: PlaybackCommand) -> Result<()> {
        command.validate()?;
        debug!("Applying {}", command.name());

        match command {
            PlaybackCommand::Load { url, rate, window } => {
                self.load(&url, rate.unwrap_or(1.0), window);
            }
            PlaybackCommand::Play => self.surface.play(),
            PlaybackCommand::Pause => self.surface.pause(),
            PlaybackCommand::Seek { seconds } => self.seek(seconds)?,
            PlaybackCommand::SetRate { rate } => self.surface.set_rate(rate),
            PlaybackCommand::SetLoop { start, end } => self.enforcer.set_loop(start, end)?,
        }
        Ok(())
    }

    /// Load a source. The loop window is replaced before the source changes,
    /// so no time update of the new source is seen with the old window.
    pub fn load(&mut self, url: &str, rate: f64, window: Option<LoopWindow>) {
        self.enforcer.replace(window);
        self.surface.load(url, rate);
    }

    /// Resume playback
    pub fn play(&mut self) {
        self.surface.play();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.surface.pause();
    }

    /// Seek to a non-negative position
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let seconds = check_position(seconds)?;
        self.surface.seek(seconds);
        Ok(())
    }

    /// Change playback speed
    pub fn set_rate(&mut self, rate: f64) {
        self.surface.set_rate(rate);
    }

    /// Set the loop window; unordered bounds keep the previous window
    pub fn set_loop(&mut self, start: f64, end: f64) -> Result<()> {
        self.enforcer.set_loop(start, end)
    }

    /// Disable loop enforcement
    pub fn clear_loop(&mut self) {
        self.enforcer.clear();
    }

    /// Clear the source, release it and disable the loop
    pub fn reset(&mut self) {
        self.enforcer.clear();
        self.surface.reset();
    }

    /// Feed a runtime event. Time updates run through loop enforcement and
    /// may issue one corrective seek.
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        let seeked = matches!(event, MediaEvent::Seeked);
        if let Some(position) = self.surface.handle_event(event) {
            if let Some(target) = self.enforcer.on_time_update(position) {
                self.surface.seek(target);
            }
        } else if seeked {
            self.enforcer.on_seeked();
        }
    }

    /// The playback surface
    pub fn surface(&self) -> &PlaybackSurface<B> {
        &self.surface
    }

    /// Mutable access to the playback surface
    pub fn surface_mut(&mut self) -> &mut PlaybackSurface<B> {
        &mut self.surface
    }

    /// The loop enforcer
    pub fn enforcer(&self) -> &LoopEnforcer {
        &self.enforcer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::tests::RecordingBackend;
    use crate::{CoreError, LoopState, SurfaceStatus};

    fn controller() -> PlaybackController<RecordingBackend> {
        PlaybackController::new(RecordingBackend::default())
    }

    fn seeks(controller: &PlaybackController<RecordingBackend>) -> Vec<String> {
        controller
            .surface()
            .backend()
            .calls
            .iter()
            .filter(|c| c.starts_with("seek"))
            .cloned()
            .collect()
    }

    #[test]
    fn test_load_without_window_disables_loop() {
        let mut c = controller();
        c.apply(PlaybackCommand::SetLoop {
            start: 1.0,
            end: 2.0,
        })
        .unwrap();
        c.apply(PlaybackCommand::Load {
            url: "/b.mp4".to_string(),
            rate: None,
            window: None,
        })
        .unwrap();

        assert_eq!(c.enforcer().state(), LoopState::Disabled);
        c.handle_media_event(MediaEvent::TimeUpdate { position: 5.0 });
        assert!(seeks(&c).is_empty());
    }

    #[test]
    fn test_load_with_window_is_active_from_first_update() {
        let mut c = controller();
        let window = LoopWindow::new(3.0, 6.0).unwrap();
        c.apply(PlaybackCommand::Load {
            url: "/b.mp4".to_string(),
            rate: Some(0.5),
            window: Some(window),
        })
        .unwrap();

        assert_eq!(c.surface().rate(), 0.5);
        c.handle_media_event(MediaEvent::TimeUpdate { position: 6.5 });
        assert_eq!(seeks(&c), vec!["seek 3"]);
    }

    #[test]
    fn test_rejected_set_loop_keeps_window() {
        let mut c = controller();
        c.set_loop(1.0, 2.0).unwrap();
        let err = c
            .apply(PlaybackCommand::SetLoop {
                start: 4.0,
                end: 4.0,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLoopWindow { .. }));
        assert_eq!(c.enforcer().window(), Some(LoopWindow::new(1.0, 2.0).unwrap()));
    }

    #[test]
    fn test_seek_and_rate_commands() {
        let mut c = controller();
        c.load("/a.mp4", 1.0, None);
        c.apply(PlaybackCommand::Seek { seconds: 12.0 }).unwrap();
        c.apply(PlaybackCommand::SetRate { rate: 0.75 }).unwrap();

        assert_eq!(c.surface().position(), 12.0);
        assert_eq!(c.surface().rate(), 0.75);
        assert!(c.apply(PlaybackCommand::SetRate { rate: -2.0 }).is_err());
        assert_eq!(c.surface().rate(), 0.75);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = controller();
        c.load("/a.mp4", 1.0, Some(LoopWindow::new(0.0, 1.0).unwrap()));
        c.reset();
        assert_eq!(c.surface().status(), &SurfaceStatus::Idle);
        assert!(!c.enforcer().is_active());
    }
}
