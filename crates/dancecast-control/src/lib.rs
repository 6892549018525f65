//! Dancecast Control - Remote Command Channel
//!
//! This crate connects a receiver to the coordinating server:
//! - **Protocol**: JSON envelopes with field-alias resolution
//! - **Channel**: reconnecting registration state machine without I/O
//! - **Client**: tokio + tokio-tungstenite driver with a cancelable reconnect timer
//! - **Catalog**: `GET /api/videos` over reqwest
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dancecast_control::{channel_url, parse_origin, CommandChannel};
//!
//! let origin = parse_origin("http://192.168.1.20:8000").unwrap();
//! let endpoint = channel_url(&origin).unwrap();
//! let mut channel = CommandChannel::new(endpoint, "http://192.168.1.20:8000", "Living Room");
//! let actions = channel.start();
//! ```

#![allow(missing_docs)]

/// Catalog endpoint client
pub mod catalog_client;
/// Reconnecting channel state machine
pub mod channel;
/// Async driver and transports
pub mod client;
/// Server origin and endpoint URLs
pub mod endpoint;
/// Error types
pub mod error;
/// Wire protocol
pub mod protocol;

// Re-exports
pub use catalog_client::CatalogClient;
pub use channel::{
    ChannelAction, ChannelEvent, CommandChannel, ConnectionState, DEFAULT_RECONNECT_DELAY,
    IDLE_STATUS,
};
pub use client::{ChannelDriver, Connection, Connector, WsConnection, WsConnector};
pub use endpoint::{channel_url, origin_string, parse_origin};
pub use error::{ControlError, Result};
pub use protocol::{decode, InboundMessage, OutboundMessage};
