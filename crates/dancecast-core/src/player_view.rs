//! Player view of the browser path
//!
//! Binds transport controls, the speed selector and the interactive A/B
//! markers to a [`PlaybackController`], and tracks which entry is open so
//! that a deferred source assignment can tell it has been superseded.

use crate::{
    location::watch_fragment, resolve_media_url, MediaBackend, MediaEvent, PlaybackController,
    Result, SurfaceStatus,
};
use tracing::{debug, warn};

/// Seconds moved by the skip buttons
pub const SKIP_SECONDS: f64 = 10.0;

/// Which entry is open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSession {
    /// Path of the open entry
    pub current_path: Option<String>,
    /// Whether the player replaces the list
    pub is_visible: bool,
}

/// Source assignment postponed by one scheduling tick.
///
/// The host runs [`PlayerView::assign_source`] with it on its next tick, after
/// the previous resource was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredSource {
    token: u64,
    path: String,
    url: String,
}

impl DeferredSource {
    /// Entry path this assignment is for
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolved media URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Status line of the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerStatus {
    /// Player hidden
    Hidden,
    /// Waiting for the source
    Loading,
    /// Source is playing or ready
    Ready,
    /// The source failed
    Failed(String),
}

impl PlayerStatus {
    /// Text shown to the user
    pub fn display_text(&self) -> String {
        match self {
            PlayerStatus::Hidden | PlayerStatus::Ready => String::new(),
            PlayerStatus::Loading => "Loading…".to_string(),
            PlayerStatus::Failed(message) => format!("Could not play video: {message}"),
        }
    }
}

/// Browser-side player
#[derive(Debug)]
pub struct PlayerView {
    origin: String,
    session: PlayerSession,
    token: u64,
    speed: f64,
    mark_a: Option<f64>,
    mark_b: Option<f64>,
    status: PlayerStatus,
    fragment: Option<String>,
}

impl PlayerView {
    /// Create a hidden player for a server origin
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            session: PlayerSession::default(),
            token: 0,
            speed: 1.0,
            mark_a: None,
            mark_b: None,
            status: PlayerStatus::Hidden,
            fragment: None,
        }
    }

    /// Open an entry.
    ///
    /// The surface is reset right away; the new source is returned as a
    /// [`DeferredSource`] to be assigned on the next tick.
    pub fn open<B: MediaBackend>(
        &mut self,
        path: &str,
        controller: &mut PlaybackController<B>,
    ) -> DeferredSource {
        controller.reset();
        self.token += 1;
        self.session = PlayerSession {
            current_path: Some(path.to_string()),
            is_visible: true,
        };
        self.mark_a = None;
        self.mark_b = None;
        self.status = PlayerStatus::Loading;
        self.fragment = Some(watch_fragment(path));

        DeferredSource {
            token: self.token,
            path: path.to_string(),
            url: self.media_url(path),
        }
    }

    /// Assign a deferred source. Returns `false` when another open or a close
    /// happened in between, in which case the surface is not touched.
    pub fn assign_source<B: MediaBackend>(
        &mut self,
        deferred: &DeferredSource,
        controller: &mut PlaybackController<B>,
    ) -> bool {
        let current = self.session.current_path.as_deref() == Some(deferred.path.as_str());
        if deferred.token != self.token || !current {
            debug!("Dropping superseded source assignment for {}", deferred.path);
            return false;
        }
        controller.load(&deferred.url, self.speed, None);
        true
    }

    /// Return to the list: release the source and clear the fragment
    pub fn close<B: MediaBackend>(&mut self, controller: &mut PlaybackController<B>) {
        controller.reset();
        self.token += 1;
        self.session = PlayerSession::default();
        self.mark_a = None;
        self.mark_b = None;
        self.status = PlayerStatus::Hidden;
        self.fragment = None;
    }

    /// Feed a media event of the player's surface
    pub fn handle_media_event<B: MediaBackend>(
        &mut self,
        event: MediaEvent,
        controller: &mut PlaybackController<B>,
    ) {
        controller.handle_media_event(event);
        if !self.session.is_visible {
            return;
        }
        self.status = match controller.surface().status() {
            SurfaceStatus::Failed(message) => PlayerStatus::Failed(message.clone()),
            SurfaceStatus::Playing | SurfaceStatus::Paused => PlayerStatus::Ready,
            SurfaceStatus::Loading | SurfaceStatus::Idle => self.status.clone(),
        };
        if matches!(self.status, PlayerStatus::Loading)
            && controller.surface().duration().is_some()
        {
            self.status = PlayerStatus::Ready;
        }
    }

    /// Play button
    pub fn play<B: MediaBackend>(&self, controller: &mut PlaybackController<B>) {
        controller.play();
    }

    /// Pause button
    pub fn pause<B: MediaBackend>(&self, controller: &mut PlaybackController<B>) {
        controller.pause();
    }

    /// Speed selector changed
    pub fn set_speed<B: MediaBackend>(
        &mut self,
        rate: f64,
        controller: &mut PlaybackController<B>,
    ) -> Result<()> {
        let rate = crate::command::check_rate(rate)?;
        self.speed = rate;
        controller.set_rate(rate);
        Ok(())
    }

    /// Seek bar moved to `percent` of the duration
    pub fn seek_percent<B: MediaBackend>(
        &self,
        percent: f64,
        controller: &mut PlaybackController<B>,
    ) -> Result<()> {
        let Some(duration) = controller.surface().duration() else {
            return Ok(());
        };
        let percent = percent.clamp(0.0, 100.0);
        controller.seek(percent / 100.0 * duration)
    }

    /// Skip by `delta` seconds, kept inside `[0, duration]`
    pub fn skip<B: MediaBackend>(
        &self,
        delta: f64,
        controller: &mut PlaybackController<B>,
    ) -> Result<()> {
        let position = controller.surface().position() + delta;
        let upper = controller.surface().duration().unwrap_or(0.0);
        let target = if delta >= 0.0 {
            position.min(upper)
        } else {
            position
        };
        controller.seek(target.max(0.0))
    }

    /// "Set A": mark the loop start at the current position.
    ///
    /// A B mark at or before the new A is dropped.
    pub fn set_mark_a<B: MediaBackend>(&mut self, controller: &mut PlaybackController<B>) {
        let a = controller.surface().position();
        self.mark_a = Some(a);
        if self.mark_b.is_some_and(|b| b <= a) {
            self.mark_b = None;
        }
        self.sync_loop(controller);
    }

    /// "Set B": mark the loop end at the current position.
    ///
    /// An A mark at or after the new B is dropped.
    pub fn set_mark_b<B: MediaBackend>(&mut self, controller: &mut PlaybackController<B>) {
        let b = controller.surface().position();
        self.mark_b = Some(b);
        if self.mark_a.is_some_and(|a| b <= a) {
            self.mark_a = None;
        }
        self.sync_loop(controller);
    }

    fn sync_loop<B: MediaBackend>(&self, controller: &mut PlaybackController<B>) {
        match (self.mark_a, self.mark_b) {
            (Some(a), Some(b)) => {
                if let Err(e) = controller.set_loop(a, b) {
                    warn!("Loop markers rejected: {}", e);
                }
            }
            _ => controller.clear_loop(),
        }
    }

    /// `m:ss / m:ss` for the time label
    pub fn time_display<B: MediaBackend>(&self, controller: &PlaybackController<B>) -> String {
        let surface = controller.surface();
        format!(
            "{} / {}",
            format_time(surface.position()),
            format_time(surface.duration().unwrap_or(f64::NAN))
        )
    }

    /// Seek bar value in percent, `None` while the duration is unknown
    pub fn seek_bar_percent<B: MediaBackend>(
        &self,
        controller: &PlaybackController<B>,
    ) -> Option<f64> {
        let duration = controller.surface().duration()?;
        if duration <= 0.0 || !duration.is_finite() {
            return None;
        }
        Some(controller.surface().position() / duration * 100.0)
    }

    /// Loop label: `A=m:ss B=m:ss` or `Off`
    pub fn loop_status(&self) -> String {
        match (self.mark_a, self.mark_b) {
            (Some(a), Some(b)) => format!("A={} B={}", format_time(a), format_time(b)),
            _ => "Off".to_string(),
        }
    }

    /// Session state
    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    /// Status line
    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    /// Published location fragment
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Selected speed
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current A/B marks
    pub fn marks(&self) -> (Option<f64>, Option<f64>) {
        (self.mark_a, self.mark_b)
    }

    /// Media URL for a path on this player's origin
    pub fn media_url(&self, path: &str) -> String {
        resolve_media_url(&self.origin, &crate::encode_path(path))
    }
}

/// Format seconds as `m:ss`; unknown values show `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::tests::RecordingBackend;

    fn setup() -> (PlayerView, PlaybackController<RecordingBackend>) {
        (
            PlayerView::new("http://host:8000"),
            PlaybackController::new(RecordingBackend::default()),
        )
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.9), "0:09");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_open_defers_source() {
        let (mut view, mut controller) = setup();
        let deferred = view.open("/videos/a b.mp4", &mut controller);

        assert_eq!(controller.surface().source(), None);
        assert_eq!(view.status(), &PlayerStatus::Loading);
        assert_eq!(view.fragment(), Some("#/watch/videos/a%20b.mp4"));
        assert_eq!(deferred.url(), "http://host:8000/videos/a%20b.mp4");

        assert!(view.assign_source(&deferred, &mut controller));
        assert_eq!(
            controller.surface().source(),
            Some("http://host:8000/videos/a%20b.mp4")
        );
    }

    #[test]
    fn test_superseded_assignment_is_dropped() {
        let (mut view, mut controller) = setup();
        let first = view.open("/videos/a.mp4", &mut controller);
        let second = view.open("/videos/b.mp4", &mut controller);

        assert!(!view.assign_source(&first, &mut controller));
        assert_eq!(controller.surface().source(), None);

        assert!(view.assign_source(&second, &mut controller));
        assert_eq!(
            controller.surface().source(),
            Some("http://host:8000/videos/b.mp4")
        );
    }

    #[test]
    fn test_reopening_same_path_supersedes_older_assignment() {
        let (mut view, mut controller) = setup();
        let first = view.open("/videos/a.mp4", &mut controller);
        let _second = view.open("/videos/a.mp4", &mut controller);
        assert!(!view.assign_source(&first, &mut controller));
    }

    #[test]
    fn test_close_cancels_pending_assignment() {
        let (mut view, mut controller) = setup();
        let deferred = view.open("/videos/a.mp4", &mut controller);
        view.close(&mut controller);

        assert!(!view.assign_source(&deferred, &mut controller));
        assert_eq!(view.session(), &PlayerSession::default());
        assert_eq!(view.fragment(), None);
    }

    #[test]
    fn test_marks_swap_or_clear() {
        let (mut view, mut controller) = setup();
        let deferred = view.open("/videos/a.mp4", &mut controller);
        view.assign_source(&deferred, &mut controller);

        controller.seek(10.0).unwrap();
        view.set_mark_a(&mut controller);
        assert_eq!(view.loop_status(), "Off");
        assert!(!controller.enforcer().is_active());

        controller.seek(20.0).unwrap();
        view.set_mark_b(&mut controller);
        assert_eq!(view.loop_status(), "A=0:10 B=0:20");
        assert!(controller.enforcer().is_active());

        // B moved before A drops A and disables the loop
        controller.seek(5.0).unwrap();
        view.set_mark_b(&mut controller);
        assert_eq!(view.marks(), (None, Some(5.0)));
        assert!(!controller.enforcer().is_active());

        // A moved past B drops B
        controller.seek(8.0).unwrap();
        view.set_mark_a(&mut controller);
        assert_eq!(view.marks(), (Some(8.0), None));
    }

    #[test]
    fn test_skip_and_seek_bar() {
        let (mut view, mut controller) = setup();
        controller.surface_mut().backend_mut().duration = Some(30.0);
        let deferred = view.open("/videos/a.mp4", &mut controller);
        view.assign_source(&deferred, &mut controller);

        view.skip(SKIP_SECONDS, &mut controller).unwrap();
        assert_eq!(controller.surface().position(), 10.0);
        view.skip(-25.0, &mut controller).unwrap();
        assert_eq!(controller.surface().position(), 0.0);

        view.seek_percent(50.0, &mut controller).unwrap();
        assert_eq!(controller.surface().position(), 15.0);
        assert_eq!(view.seek_bar_percent(&controller), Some(50.0));
        assert_eq!(view.time_display(&controller), "0:15 / 0:30");
    }

    #[test]
    fn test_speed_applies_to_next_open() {
        let (mut view, mut controller) = setup();
        view.set_speed(0.5, &mut controller).unwrap();
        assert!(view.set_speed(0.0, &mut controller).is_err());

        let deferred = view.open("/videos/a.mp4", &mut controller);
        view.assign_source(&deferred, &mut controller);
        assert_eq!(controller.surface().rate(), 0.5);
    }

    #[test]
    fn test_media_error_is_shown() {
        let (mut view, mut controller) = setup();
        let deferred = view.open("/videos/a.mp4", &mut controller);
        view.assign_source(&deferred, &mut controller);
        view.handle_media_event(
            MediaEvent::Error {
                message: "unsupported".to_string(),
            },
            &mut controller,
        );
        assert_eq!(
            view.status().display_text(),
            "Could not play video: unsupported"
        );
    }
}
