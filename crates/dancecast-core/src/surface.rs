//! Playback surface
//!
//! Wraps the single media handle of a client behind primitive operations.
//! The surface knows nothing about remote commands or loops; it only tracks
//! the source, the rate and a display status.

use crate::command::check_rate;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors reported by a media backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    /// The runtime refused to start playback without user interaction
    #[error("Playback was rejected by the runtime")]
    PlaybackRejected,

    /// The source could not be opened
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// The media handle driven by a surface.
///
/// Implementations clamp seeks to `[0, duration]` themselves and report
/// progress through [`MediaEvent`]s fed back into the surface.
pub trait MediaBackend {
    /// Set or clear the source. Clearing releases decoder resources.
    fn set_source(&mut self, url: Option<&str>);

    /// Start or resume playback
    fn play(&mut self) -> Result<(), MediaError>;

    /// Pause playback
    fn pause(&mut self);

    /// Move to a position in seconds
    fn seek(&mut self, seconds: f64);

    /// Change the playback rate without moving the position
    fn set_rate(&mut self, rate: f64);

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Duration in seconds, once known
    fn duration(&self) -> Option<f64>;
}

/// Events emitted by the media runtime for the current source.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata is available
    LoadedMetadata {
        /// Duration in seconds
        duration: f64,
    },
    /// Playback position advanced
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },
    /// A seek completed
    Seeked,
    /// Playback started
    Playing,
    /// Playback paused
    Paused,
    /// The source failed to load or decode
    Error {
        /// Runtime description of the failure
        message: String,
    },
}

/// What the surface currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceStatus {
    /// No source
    Idle,
    /// Source assigned, waiting for playback
    Loading,
    /// Playing
    Playing,
    /// Paused, including a refused autoplay
    Paused,
    /// The source failed; a fresh load is required
    Failed(String),
}

impl SurfaceStatus {
    /// Text shown to the user
    pub fn display_text(&self) -> String {
        match self {
            SurfaceStatus::Idle => "Idle".to_string(),
            SurfaceStatus::Loading => "Loading…".to_string(),
            SurfaceStatus::Playing => "Playing".to_string(),
            SurfaceStatus::Paused => "Paused".to_string(),
            SurfaceStatus::Failed(message) => format!("Error: {message}"),
        }
    }
}

/// The single playback surface of a client.
pub struct PlaybackSurface<B: MediaBackend> {
    backend: B,
    source: Option<String>,
    rate: f64,
    duration: Option<f64>,
    status: SurfaceStatus,
}

impl<B: MediaBackend> PlaybackSurface<B> {
    /// Create an idle surface over a backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            source: None,
            rate: 1.0,
            duration: None,
            status: SurfaceStatus::Idle,
        }
    }

    /// Assign a source and a rate, then try to start playback.
    ///
    /// A refused autoplay leaves the surface paused; the user has to interact.
    pub fn load(&mut self, url: &str, rate: f64) {
        let rate = match check_rate(rate) {
            Ok(rate) => rate,
            Err(e) => {
                warn!("Ignoring load rate: {}", e);
                1.0
            }
        };

        info!(url = %url, rate, "Loading source");
        self.backend.set_source(Some(url));
        self.backend.set_rate(rate);
        self.source = Some(url.to_string());
        self.rate = rate;
        self.duration = None;
        self.status = SurfaceStatus::Loading;

        match self.backend.play() {
            Ok(()) => self.status = SurfaceStatus::Playing,
            Err(MediaError::PlaybackRejected) => {
                debug!("Autoplay rejected for {}", url);
                self.status = SurfaceStatus::Paused;
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Resume playback. Calling it while playing does nothing.
    pub fn play(&mut self) {
        if !self.accepts_transport() || self.status == SurfaceStatus::Playing {
            return;
        }
        match self.backend.play() {
            Ok(()) => self.status = SurfaceStatus::Playing,
            Err(MediaError::PlaybackRejected) => debug!("Play rejected by runtime"),
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Pause playback. Calling it while paused does nothing.
    pub fn pause(&mut self) {
        if !self.accepts_transport() || self.status == SurfaceStatus::Paused {
            return;
        }
        self.backend.pause();
        self.status = SurfaceStatus::Paused;
    }

    /// Move to a position; the backend clamps it to the media bounds.
    pub fn seek(&mut self, seconds: f64) {
        if !self.accepts_transport() {
            return;
        }
        self.backend.seek(seconds);
    }

    /// Change speed without moving the position
    pub fn set_rate(&mut self, rate: f64) {
        match check_rate(rate) {
            Ok(rate) => {
                self.rate = rate;
                if self.accepts_transport() {
                    self.backend.set_rate(rate);
                }
            }
            Err(e) => warn!("Ignoring rate change: {}", e),
        }
    }

    /// Clear the source and release the backend's resources
    pub fn reset(&mut self) {
        if self.source.is_some() {
            debug!("Releasing source {:?}", self.source);
        }
        self.backend.pause();
        self.backend.set_source(None);
        self.source = None;
        self.duration = None;
        self.status = SurfaceStatus::Idle;
    }

    /// Feed a runtime event into the surface.
    ///
    /// Returns the new position for time updates of the current source so the
    /// caller can hand it to the loop enforcer.
    pub fn handle_event(&mut self, event: MediaEvent) -> Option<f64> {
        if self.source.is_none() {
            return None;
        }

        match event {
            MediaEvent::LoadedMetadata { duration } => {
                if duration.is_finite() && duration >= 0.0 {
                    self.duration = Some(duration);
                }
                None
            }
            MediaEvent::TimeUpdate { position } => {
                if matches!(self.status, SurfaceStatus::Failed(_)) {
                    None
                } else {
                    Some(position)
                }
            }
            MediaEvent::Playing => {
                if self.accepts_transport() {
                    self.status = SurfaceStatus::Playing;
                }
                None
            }
            MediaEvent::Paused => {
                if self.accepts_transport() {
                    self.status = SurfaceStatus::Paused;
                }
                None
            }
            MediaEvent::Seeked => None,
            MediaEvent::Error { message } => {
                self.fail(message);
                None
            }
        }
    }

    fn fail(&mut self, message: String) {
        warn!("Playback failed for {:?}: {}", self.source, message);
        self.status = SurfaceStatus::Failed(message);
    }

    fn accepts_transport(&self) -> bool {
        self.source.is_some() && !matches!(self.status, SurfaceStatus::Failed(_))
    }

    /// Current status
    pub fn status(&self) -> &SurfaceStatus {
        &self.status
    }

    /// Current source URL
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Requested playback rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Current position as reported by the backend
    pub fn position(&self) -> f64 {
        self.backend.position()
    }

    /// Known duration, from metadata or the backend
    pub fn duration(&self) -> Option<f64> {
        self.duration.or_else(|| self.backend.duration())
    }

    /// Access the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
