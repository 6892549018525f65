//! A–B loop enforcement
//!
//! The enforcer watches time updates of the playback surface. While a window
//! is active and playback reaches its end bound, it asks for one seek back to
//! the start bound. Further updates past the end are ignored until the seek
//! has been observed, so a slow seek never turns into a burst of corrections.

use crate::command::check_position;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A playback window with `start < end`, both in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct LoopWindow {
    start: f64,
    end: f64,
}

/// Unchecked bounds as they appear on disk or on the wire
#[derive(Deserialize)]
struct WindowBounds {
    start: f64,
    end: f64,
}

impl TryFrom<WindowBounds> for LoopWindow {
    type Error = CoreError;

    fn try_from(bounds: WindowBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl LoopWindow {
    /// Create a window, rejecting unordered or invalid bounds.
    pub fn new(start: f64, end: f64) -> Result<Self> {
        let start = check_position(start)?;
        let end = check_position(end)?;
        if start >= end {
            return Err(CoreError::InvalidLoopWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window start in seconds
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Window end in seconds
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the window in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Enforcement state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopState {
    /// No window, playback runs freely
    Disabled,
    /// Playback is held inside the window
    Active(LoopWindow),
}

/// Keeps playback inside the current loop window.
#[derive(Debug)]
pub struct LoopEnforcer {
    state: LoopState,
    correction_pending: bool,
}

impl Default for LoopEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopEnforcer {
    /// Create a disabled enforcer
    pub fn new() -> Self {
        Self {
            state: LoopState::Disabled,
            correction_pending: false,
        }
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The active window, if any
    pub fn window(&self) -> Option<LoopWindow> {
        match self.state {
            LoopState::Active(window) => Some(window),
            LoopState::Disabled => None,
        }
    }

    /// Whether a window is being enforced
    pub fn is_active(&self) -> bool {
        matches!(self.state, LoopState::Active(_))
    }

    /// Apply a `SetLoop` request.
    ///
    /// Unordered bounds are rejected and the current window is kept.
    pub fn set_loop(&mut self, start: f64, end: f64) -> Result<()> {
        let window = LoopWindow::new(start, end)?;
        debug!("Loop window set to {:.3}..{:.3}", window.start, window.end);
        self.replace(Some(window));
        Ok(())
    }

    /// Replace the window in one step, used when a new source is loaded.
    pub fn replace(&mut self, window: Option<LoopWindow>) {
        self.state = match window {
            Some(window) => LoopState::Active(window),
            None => LoopState::Disabled,
        };
        self.correction_pending = false;
    }

    /// Disable enforcement
    pub fn clear(&mut self) {
        if self.is_active() {
            debug!("Loop window cleared");
        }
        self.replace(None);
    }

    /// React to a time update. Returns the position to seek to, if any.
    pub fn on_time_update(&mut self, current_time: f64) -> Option<f64> {
        let LoopState::Active(window) = self.state else {
            return None;
        };

        if current_time >= window.end {
            if self.correction_pending {
                trace!("Loop correction already in flight at {:.3}", current_time);
                return None;
            }
            self.correction_pending = true;
            trace!("Loop end {:.3} reached at {:.3}", window.end, current_time);
            Some(window.start)
        } else {
            self.correction_pending = false;
            None
        }
    }

    /// The surface finished a seek; a further crossing may be corrected again.
    pub fn on_seeked(&mut self) {
        self.correction_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_requires_ordered_bounds() {
        assert!(LoopWindow::new(1.0, 2.0).is_ok());
        assert!(matches!(
            LoopWindow::new(2.0, 2.0),
            Err(CoreError::InvalidLoopWindow { .. })
        ));
        assert!(matches!(
            LoopWindow::new(3.0, 2.0),
            Err(CoreError::InvalidLoopWindow { .. })
        ));
        assert!(LoopWindow::new(-1.0, 2.0).is_err());
        assert!(LoopWindow::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_deserialized_window_is_checked() {
        let window: LoopWindow = serde_json::from_str(r#"{"start":2.0,"end":5.0}"#).unwrap();
        assert_eq!(window, LoopWindow::new(2.0, 5.0).unwrap());

        assert!(serde_json::from_str::<LoopWindow>(r#"{"start":5.0,"end":2.0}"#).is_err());
        assert!(serde_json::from_str::<LoopWindow>(r#"{"start":3.0,"end":3.0}"#).is_err());
        assert!(serde_json::from_str::<LoopWindow>(r#"{"start":-1.0,"end":3.0}"#).is_err());
    }

    #[test]
    fn test_disabled_never_corrects() {
        let mut enforcer = LoopEnforcer::new();
        assert_eq!(enforcer.on_time_update(1000.0), None);
    }

    #[test]
    fn test_single_correction_per_crossing() {
        let mut enforcer = LoopEnforcer::new();
        enforcer.set_loop(2.0, 4.0).unwrap();

        assert_eq!(enforcer.on_time_update(3.9), None);
        assert_eq!(enforcer.on_time_update(4.0), Some(2.0));
        // Stale update before the seek lands
        assert_eq!(enforcer.on_time_update(4.1), None);
        // Seek landed
        assert_eq!(enforcer.on_time_update(2.0), None);
        assert_eq!(enforcer.on_time_update(4.2), Some(2.0));
    }

    #[test]
    fn test_seeked_rearms_correction() {
        let mut enforcer = LoopEnforcer::new();
        enforcer.set_loop(2.0, 4.0).unwrap();

        assert_eq!(enforcer.on_time_update(5.0), Some(2.0));
        enforcer.on_seeked();
        assert_eq!(enforcer.on_time_update(5.0), Some(2.0));
    }

    #[test]
    fn test_rejected_window_keeps_previous() {
        let mut enforcer = LoopEnforcer::new();
        enforcer.set_loop(1.0, 3.0).unwrap();

        let err = enforcer.set_loop(5.0, 4.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLoopWindow { .. }));
        assert_eq!(enforcer.window(), Some(LoopWindow::new(1.0, 3.0).unwrap()));
    }

    #[test]
    fn test_clear_disables() {
        let mut enforcer = LoopEnforcer::new();
        enforcer.set_loop(1.0, 3.0).unwrap();
        enforcer.clear();
        assert_eq!(enforcer.state(), LoopState::Disabled);
        assert_eq!(enforcer.on_time_update(10.0), None);
    }
}
