//! Error types for the command channel and the catalog client
use dancecast_core::CoreError;
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// The payload is not a JSON object envelope
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The envelope carries a `type` this client does not handle
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A command is missing a required field
    #[error("Incomplete command fields: {0}")]
    IncompleteCommandFields(String),

    /// The command decoded but its values were rejected
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CoreError),

    /// The channel closed
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server origin could not be parsed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Server origin uses a scheme other than http or https
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The catalog endpoint answered with an error status
    #[error("Catalog fetch failed: {0}")]
    CatalogFetchFailed(String),
}

impl ControlError {
    /// Convert into the error the catalog view renders as list status
    pub fn into_catalog_error(self) -> CoreError {
        match self {
            ControlError::CatalogFetchFailed(reason) => CoreError::CatalogFetchFailed(reason),
            other => CoreError::CatalogFetchFailed(other.to_string()),
        }
    }
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
