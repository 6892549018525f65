//! Catalog endpoint client

use crate::endpoint::{origin_string, CATALOG_PATH};
use crate::{ControlError, Result};
use dancecast_core::CatalogResponse;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches `GET /api/videos` from a server origin
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    origin: Url,
}

impl CatalogClient {
    /// Create a client for an http(s) origin
    pub fn new(origin: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, origin })
    }

    /// URL of the catalog endpoint
    pub fn endpoint(&self) -> Result<Url> {
        Ok(self.origin.join(CATALOG_PATH)?)
    }

    /// Origin string media paths resolve against
    pub fn origin(&self) -> String {
        origin_string(&self.origin)
    }

    /// Fetch the catalog. A non-success status is a `CatalogFetchFailed`
    /// carrying the status text.
    pub async fn fetch(&self) -> Result<CatalogResponse> {
        let url = self.endpoint()?;
        debug!("Fetching catalog from {}", url);

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            return Err(ControlError::CatalogFetchFailed(reason.to_string()));
        }
        Ok(resp.json().await?)
    }

    /// Fetch for a catalog view, which renders failures as list status
    pub async fn fetch_for_view(&self) -> dancecast_core::Result<CatalogResponse> {
        self.fetch().await.map_err(ControlError::into_catalog_error)
    }
}

