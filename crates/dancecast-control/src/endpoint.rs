//! Server origin and channel endpoint

use crate::{ControlError, Result};
use url::Url;

/// Fixed path of the command channel
pub const CHANNEL_PATH: &str = "/ws";
/// Path of the catalog endpoint
pub const CATALOG_PATH: &str = "/api/videos";

/// Parse a server origin such as `http://192.168.1.20:8000`.
///
/// Only `http` and `https` are accepted; path, query and fragment are dropped.
pub fn parse_origin(server: &str) -> Result<Url> {
    let mut url = Url::parse(server.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ControlError::UnsupportedScheme(other.to_string())),
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Channel URL for a page origin: `wss` iff the origin is `https`, same host,
/// path [`CHANNEL_PATH`].
pub fn channel_url(origin: &Url) -> Result<Url> {
    let scheme = if origin.scheme() == "https" { "wss" } else { "ws" };
    let host = origin
        .host_str()
        .ok_or_else(|| ControlError::MalformedMessage(format!("origin without host: {origin}")))?;
    let authority = match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok(Url::parse(&format!("{scheme}://{authority}{CHANNEL_PATH}"))?)
}

/// Origin as a string without the trailing slash, used to resolve media paths
pub fn origin_string(origin: &Url) -> String {
    origin.as_str().trim_end_matches('/').to_string()
}
