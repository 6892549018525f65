//! Dancecast Core - Playback Domain Model
//!
//! This crate contains the portable core shared by the receiver and the
//! browser clients:
//! - Remote playback commands and their validation
//! - A–B loop enforcement
//! - The playback surface contract over a media backend
//! - Catalog entries, path encoding and media URL resolution
//! - Bounded, cancelable thumbnail scheduling
//! - Catalog and player views for the browser path
//! - Client configuration
//!
//! Nothing in here performs I/O. Components react to explicit events and
//! return the work their host has to perform (loads to start, resources to
//! release, sources to assign one tick later).

#![warn(missing_docs)]

use thiserror::Error;

pub mod browser;
pub mod catalog;
pub mod catalog_view;
pub mod command;
pub mod config;
pub mod controller;
pub mod location;
pub mod loop_enforcer;
pub mod player_view;
pub mod surface;
pub mod thumbnail;

// --- Re-exports grouped by category ---

// Commands & Loop
pub use command::PlaybackCommand;
pub use loop_enforcer::{LoopEnforcer, LoopState, LoopWindow};

// Playback
pub use controller::PlaybackController;
pub use surface::{MediaBackend, MediaError, MediaEvent, PlaybackSurface, SurfaceStatus};

// Catalog & Thumbnails
pub use catalog::{encode_path, resolve_media_url, CatalogEntry, CatalogResponse};
pub use catalog_view::{CatalogStatus, CatalogView};
pub use thumbnail::{
    still_frame_target, JobHandle, JobState, LoadOutcome, LoadTicket, ThumbnailJob,
    ThumbnailScheduler, VisibilityMode,
};

// Browser path
pub use browser::{ActiveView, BrowserClient, OpenedEntry};
pub use location::{parse_watch_fragment, watch_fragment, DebugParams};
pub use player_view::{format_time, DeferredSource, PlayerSession, PlayerStatus, PlayerView};

// Configuration
pub use config::{ClientConfig, LogConfig};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Loop window bounds are not strictly ordered
    #[error("Invalid loop window: start {start} must be before end {end}")]
    InvalidLoopWindow {
        /// Requested window start in seconds
        start: f64,
        /// Requested window end in seconds
        end: f64,
    },

    /// A position or rate outside its allowed range
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The catalog endpoint could not be read
    #[error("Error loading list: {0}")]
    CatalogFetchFailed(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
