//! Wire protocol of the command channel
//!
//! Envelopes are JSON objects tagged by `type`. Field aliases (`time` and
//! `position`, `loopStart`/`loopEnd` and `a`/`b`) are resolved here, so the
//! rest of the client only sees canonical [`PlaybackCommand`]s.

use crate::{ControlError, Result};
use dancecast_core::{LoopWindow, PlaybackCommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Message sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Announce the display identity after the connection opened
    #[serde(rename = "register")]
    Register { name: String },
}

impl OutboundMessage {
    /// JSON text of the message
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decoded inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The server accepted the registration
    Registered,
    /// A playback command for this client
    Command(PlaybackCommand),
}

/// Every field any envelope may carry. Absent and `null` both decode to `None`.
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
    rate: Option<f64>,
    #[serde(rename = "loopStart")]
    loop_start: Option<f64>,
    #[serde(rename = "loopEnd")]
    loop_end: Option<f64>,
    time: Option<f64>,
    position: Option<f64>,
    a: Option<f64>,
    b: Option<f64>,
}

/// Decode one text frame of the channel
pub fn decode(text: &str) -> Result<InboundMessage> {
    let raw: RawEnvelope =
        serde_json::from_str(text).map_err(|e| ControlError::MalformedMessage(e.to_string()))?;
    let kind = raw
        .kind
        .as_deref()
        .ok_or_else(|| ControlError::MalformedMessage("missing type".to_string()))?;

    let command = match kind {
        "registered" => return Ok(InboundMessage::Registered),
        "LOAD" => {
            let url = raw
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| incomplete("LOAD requires url"))?;
            PlaybackCommand::Load {
                url,
                rate: raw.rate,
                window: load_window(&raw),
            }
        }
        "PLAY" => PlaybackCommand::Play,
        "PAUSE" => PlaybackCommand::Pause,
        "SEEK" => PlaybackCommand::Seek {
            seconds: raw
                .time
                .or(raw.position)
                .ok_or_else(|| incomplete("SEEK requires time or position"))?,
        },
        "SET_RATE" => PlaybackCommand::SetRate {
            rate: raw.rate.ok_or_else(|| incomplete("SET_RATE requires rate"))?,
        },
        "SET_LOOP" => {
            let (start, end) = match (raw.loop_start, raw.loop_end, raw.a, raw.b) {
                (Some(start), Some(end), _, _) => (start, end),
                (_, _, Some(a), Some(b)) => (a, b),
                _ => return Err(incomplete("SET_LOOP requires loopStart/loopEnd or a/b")),
            };
            PlaybackCommand::SetLoop { start, end }
        }
        other => return Err(ControlError::UnknownCommand(other.to_string())),
    };
    Ok(InboundMessage::Command(command))
}

// A LOAD with an unusable window still loads, without enforcement.
fn load_window(raw: &RawEnvelope) -> Option<LoopWindow> {
    let (start, end) = (raw.loop_start?, raw.loop_end?);
    match LoopWindow::new(start, end) {
        Ok(window) => Some(window),
        Err(e) => {
            warn!("LOAD carries an unusable loop window: {}", e);
            None
        }
    }
}

fn incomplete(what: &str) -> ControlError {
    ControlError::IncompleteCommandFields(what.to_string())
}
