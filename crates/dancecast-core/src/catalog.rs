//! Catalog entries and media URLs

use serde::{Deserialize, Serialize};

/// One playable entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display name
    pub name: String,
    /// Server-relative resource path, e.g. `/videos/salsa basics.mp4`
    pub path: String,
}

impl CatalogEntry {
    /// Create an entry
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Absolute URL of the resource, with the path percent-encoded
    pub fn media_url(&self, origin: &str) -> String {
        resolve_media_url(origin, &encode_path(&self.path))
    }
}

/// Response body of `GET /api/videos`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    /// Entries in server order
    pub videos: Vec<CatalogEntry>,
}

/// Percent-encode each path segment, keeping the `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reverse of [`encode_path`]. Segments that do not decode to UTF-8 are kept as-is.
pub fn decode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve a media URL against the page origin.
///
/// Anything starting with `http` is taken as absolute.
pub fn resolve_media_url(origin: &str, url: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{origin}{url}")
    } else {
        format!("{origin}/{url}")
    }
}
