//! Reconnecting command channel
//!
//! A state machine without I/O. The host feeds [`ChannelEvent`]s and performs
//! the returned [`ChannelAction`]s: open the socket, send frames, arm or
//! cancel the reconnect timer. Decoded commands are applied to the
//! [`PlaybackController`] in the order they were received.

use crate::protocol::{decode, InboundMessage, OutboundMessage};
use crate::ControlError;
use dancecast_core::{resolve_media_url, MediaBackend, PlaybackCommand, PlaybackController};
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use url::Url;

/// Delay between a close and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Status shown while no sender has loaded anything
pub const IDLE_STATUS: &str = "Connect from sender to load video (or add ?url=/videos/… to URL)";

/// Connection lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started yet
    Idle,
    /// Socket opening, or open and waiting for `registered`
    Connecting,
    /// The server acknowledged the registration
    Registered,
    /// Closed; a reconnect is scheduled
    Disconnected { reason: String },
    /// Torn down; no further reconnects
    Shutdown,
}

/// Input from the transport or the timer
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The socket opened
    Opened,
    /// A text frame arrived
    Message(String),
    /// The socket closed, or failed to open
    Closed { reason: String },
    /// The transport reported an error; a close follows
    TransportError(String),
    /// The reconnect delay elapsed
    ReconnectTimerFired,
}

/// Work for the host
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    /// Open a socket to the URL
    Connect(Url),
    /// Send a text frame on the open socket
    Send(String),
    /// Arm the reconnect timer
    ScheduleReconnect(Duration),
    /// Disarm the reconnect timer
    CancelReconnect,
    /// Close the socket
    Close,
}

/// Client side of the command channel
#[derive(Debug)]
pub struct CommandChannel {
    endpoint: Url,
    origin: String,
    display_name: String,
    reconnect_delay: Duration,
    state: ConnectionState,
    awaiting_open: bool,
    socket_open: bool,
    reconnect_scheduled: bool,
    status: String,
    status_override: bool,
    registrations: u64,
}

impl CommandChannel {
    /// Create a channel for `endpoint`; relative media URLs resolve against `origin`.
    pub fn new(endpoint: Url, origin: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            endpoint,
            origin: origin.into(),
            display_name: display_name.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state: ConnectionState::Idle,
            awaiting_open: false,
            socket_open: false,
            reconnect_scheduled: false,
            status: IDLE_STATUS.to_string(),
            status_override: false,
            registrations: 0,
        }
    }

    /// Use a different reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Pin the status text; connection changes no longer update it
    pub fn override_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
        self.status_override = true;
    }

    /// Begin the first connection attempt
    pub fn start(&mut self) -> Vec<ChannelAction> {
        match self.state {
            ConnectionState::Idle => self.connect(),
            _ => Vec::new(),
        }
    }

    /// Feed one event. Commands are applied to `controller` before this returns.
    pub fn handle<B: MediaBackend>(
        &mut self,
        event: ChannelEvent,
        controller: &mut PlaybackController<B>,
    ) -> Vec<ChannelAction> {
        if self.state == ConnectionState::Shutdown {
            trace!("Ignoring {:?} after shutdown", event);
            return Vec::new();
        }

        match event {
            ChannelEvent::Opened => self.on_opened(),
            ChannelEvent::Message(text) => {
                self.on_message(&text, controller);
                Vec::new()
            }
            ChannelEvent::Closed { reason } => self.on_closed(reason),
            ChannelEvent::TransportError(message) => {
                warn!("Channel transport error: {}", message);
                self.set_status(format!("Connection error: {message}"));
                Vec::new()
            }
            ChannelEvent::ReconnectTimerFired => {
                if !self.reconnect_scheduled {
                    return Vec::new();
                }
                self.reconnect_scheduled = false;
                self.connect()
            }
        }
    }

    /// Stop for good: cancel a pending reconnect and close the socket
    pub fn shutdown(&mut self) -> Vec<ChannelAction> {
        if self.state == ConnectionState::Shutdown {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.reconnect_scheduled {
            actions.push(ChannelAction::CancelReconnect);
            self.reconnect_scheduled = false;
        }
        if self.socket_open || self.awaiting_open {
            actions.push(ChannelAction::Close);
        }
        self.socket_open = false;
        self.awaiting_open = false;
        self.state = ConnectionState::Shutdown;
        info!("Command channel shut down");
        actions
    }

    fn connect(&mut self) -> Vec<ChannelAction> {
        info!("Connecting to {}", self.endpoint);
        self.state = ConnectionState::Connecting;
        self.awaiting_open = true;
        self.socket_open = false;
        self.set_status("Connecting…".to_string());
        vec![ChannelAction::Connect(self.endpoint.clone())]
    }

    fn on_opened(&mut self) -> Vec<ChannelAction> {
        // One registration per connection attempt
        if !self.awaiting_open {
            debug!("Ignoring open without a pending connection");
            return Vec::new();
        }
        self.awaiting_open = false;
        self.socket_open = true;

        let register = OutboundMessage::Register {
            name: self.display_name.clone(),
        };
        match register.encode() {
            Ok(frame) => {
                self.registrations += 1;
                debug!("Registering as '{}'", self.display_name);
                vec![ChannelAction::Send(frame)]
            }
            Err(e) => {
                warn!("Could not encode registration: {}", e);
                Vec::new()
            }
        }
    }

    fn on_message<B: MediaBackend>(&mut self, text: &str, controller: &mut PlaybackController<B>) {
        match decode(text) {
            Ok(InboundMessage::Registered) => {
                info!("Registered as '{}'", self.display_name);
                self.state = ConnectionState::Registered;
                let status = if controller.surface().source().is_some() {
                    "Playing".to_string()
                } else {
                    IDLE_STATUS.to_string()
                };
                self.set_status(status);
            }
            Ok(InboundMessage::Command(command)) => self.dispatch(command, controller),
            Err(e @ ControlError::MalformedMessage(_)) => trace!("Dropping frame: {}", e),
            Err(e) => debug!("Dropping command: {}", e),
        }
    }

    fn dispatch<B: MediaBackend>(
        &mut self,
        command: PlaybackCommand,
        controller: &mut PlaybackController<B>,
    ) {
        let command = match command {
            PlaybackCommand::Load { url, rate, window } => PlaybackCommand::Load {
                url: resolve_media_url(&self.origin, &url),
                rate,
                window,
            },
            other => other,
        };
        let is_load = matches!(command, PlaybackCommand::Load { .. });
        let name = command.name();

        match controller.apply(command) {
            Ok(()) => {
                if is_load {
                    self.status = "Playing".to_string();
                }
            }
            Err(e) => debug!("Rejected {}: {}", name, ControlError::from(e)),
        }
    }

    fn on_closed(&mut self, reason: String) -> Vec<ChannelAction> {
        self.awaiting_open = false;
        self.socket_open = false;
        if self.reconnect_scheduled {
            return Vec::new();
        }

        warn!(
            "Channel closed ({}), reconnecting in {} ms",
            reason,
            self.reconnect_delay.as_millis()
        );
        self.state = ConnectionState::Disconnected {
            reason: reason.clone(),
        };
        self.set_status(format!("Disconnected ({reason}). Reconnecting…"));
        self.reconnect_scheduled = true;
        vec![ChannelAction::ScheduleReconnect(self.reconnect_delay)]
    }

    fn set_status(&mut self, text: String) {
        if self.status_override {
            return;
        }
        if self.status != text {
            info!(status = %text, "Receiver status");
            self.status = text;
        }
    }

    /// Connection state
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Status text shown to the user
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the status text is pinned
    pub fn has_status_override(&self) -> bool {
        self.status_override
    }

    /// Registrations sent so far
    pub fn registrations(&self) -> u64 {
        self.registrations
    }

    /// Whether a reconnect timer is armed
    pub fn reconnect_scheduled(&self) -> bool {
        self.reconnect_scheduled
    }

    /// Display identity sent at registration
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Channel endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}
