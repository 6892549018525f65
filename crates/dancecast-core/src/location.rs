//! Shareable location fragment and debug query parameters

use crate::catalog::{decode_path, encode_path};

/// Prefix of the "currently playing" fragment
pub const WATCH_PREFIX: &str = "#/watch";

/// Fragment published while a catalog entry is open
pub fn watch_fragment(path: &str) -> String {
    format!("{WATCH_PREFIX}{}", encode_path(path))
}

/// Path encoded in a `#/watch<path>` fragment, percent-decoded.
///
/// The leading `#` is optional.
pub fn parse_watch_fragment(fragment: &str) -> Option<String> {
    let fragment = fragment.trim();
    let rest = fragment
        .strip_prefix(WATCH_PREFIX)
        .or_else(|| fragment.strip_prefix(&WATCH_PREFIX[1..]))?;
    if rest.is_empty() || !rest.starts_with('/') {
        return None;
    }
    Some(decode_path(rest))
}

/// Debug overrides read from the page query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugParams {
    /// Load this resource directly
    pub url: Option<String>,
    /// Display identity sent at registration
    pub name: Option<String>,
}

impl DebugParams {
    /// Parse a query string such as `?url=/videos/a.mp4&name=Living%20Room`.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_query_value(value);
            if value.is_empty() {
                continue;
            }
            match key {
                "url" => params.url = Some(value),
                "name" => params.name = Some(value),
                _ => {}
            }
        }
        params
    }

    /// Whether a local override replaces channel-driven status text
    pub fn overrides_status(&self) -> bool {
        self.url.is_some()
    }
}

fn decode_query_value(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|s| s.into_owned())
        .unwrap_or(value)
}
