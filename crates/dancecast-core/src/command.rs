//! Remote playback commands
//!
//! Commands arrive already canonicalised: field-name aliases from the wire
//! are resolved by the decoder before a `PlaybackCommand` is built.

use crate::{CoreError, LoopWindow, Result};

/// A command applied to the single playback surface of a client.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Replace the source, optionally with a rate and a loop window that
    /// becomes active together with the new source.
    Load {
        /// Source URL, absolute or origin-relative
        url: String,
        /// Initial playback rate, 1.0 when absent
        rate: Option<f64>,
        /// Loop window to enforce from the first time update of the source
        window: Option<LoopWindow>,
    },
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Jump to a position in seconds
    Seek {
        /// Target position in seconds
        seconds: f64,
    },
    /// Change playback speed
    SetRate {
        /// New rate, strictly positive
        rate: f64,
    },
    /// Set the A–B loop window
    SetLoop {
        /// Window start in seconds
        start: f64,
        /// Window end in seconds
        end: f64,
    },
}

impl PlaybackCommand {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackCommand::Load { .. } => "LOAD",
            PlaybackCommand::Play => "PLAY",
            PlaybackCommand::Pause => "PAUSE",
            PlaybackCommand::Seek { .. } => "SEEK",
            PlaybackCommand::SetRate { .. } => "SET_RATE",
            PlaybackCommand::SetLoop { .. } => "SET_LOOP",
        }
    }

    /// Check the numeric invariants of the command.
    ///
    /// Loop ordering is not checked here; the loop enforcer owns that rule.
    pub fn validate(&self) -> Result<()> {
        match self {
            PlaybackCommand::Load { url, rate, .. } => {
                if url.is_empty() {
                    return Err(CoreError::InvalidValue("empty source url".to_string()));
                }
                if let Some(rate) = rate {
                    check_rate(*rate)?;
                }
                Ok(())
            }
            PlaybackCommand::Play | PlaybackCommand::Pause => Ok(()),
            PlaybackCommand::Seek { seconds } => check_position(*seconds).map(|_| ()),
            PlaybackCommand::SetRate { rate } => check_rate(*rate).map(|_| ()),
            PlaybackCommand::SetLoop { start, end } => {
                check_position(*start)?;
                check_position(*end)?;
                Ok(())
            }
        }
    }
}

/// Positions are finite and non-negative.
pub fn check_position(seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(CoreError::InvalidValue(format!("position {seconds}")))
    }
}

/// Rates are finite and strictly positive.
pub fn check_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(CoreError::InvalidValue(format!("rate {rate}")))
    }
}
