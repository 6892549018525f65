//! Catalog view
//!
//! Holds the fetched catalog, its list-level status text and the thumbnail
//! scheduler of the list.

use crate::{
    resolve_media_url, CatalogEntry, CatalogResponse, CoreError, JobHandle, LoadOutcome,
    LoadTicket, ThumbnailScheduler, VisibilityMode,
};
use tracing::{info, warn};

/// List-level status
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogStatus {
    /// Nothing requested yet
    Idle,
    /// Request in flight
    Loading,
    /// Entries available
    Ready,
    /// The server has no entries
    Empty,
    /// The request failed; the user has to reload
    Failed(String),
}

impl CatalogStatus {
    /// Text shown above the list
    pub fn display_text(&self) -> String {
        match self {
            CatalogStatus::Idle => String::new(),
            CatalogStatus::Loading => "Loading…".to_string(),
            CatalogStatus::Ready => "Pick a video:".to_string(),
            CatalogStatus::Empty => {
                "No videos found. Add files to the server media folder.".to_string()
            }
            CatalogStatus::Failed(reason) => format!("Error loading list: {reason}"),
        }
    }
}

/// Selectable list of catalog entries with lazily loaded previews
#[derive(Debug)]
pub struct CatalogView {
    origin: String,
    entries: Vec<CatalogEntry>,
    handles: Vec<JobHandle>,
    scheduler: ThumbnailScheduler,
    status: CatalogStatus,
}

impl CatalogView {
    /// Create an empty view for a server origin
    pub fn new(origin: impl Into<String>, concurrency: usize, mode: VisibilityMode) -> Self {
        Self {
            origin: origin.into(),
            entries: Vec::new(),
            handles: Vec::new(),
            scheduler: ThumbnailScheduler::new(concurrency, mode),
            status: CatalogStatus::Idle,
        }
    }

    /// A catalog request was sent
    pub fn begin_fetch(&mut self) {
        self.status = CatalogStatus::Loading;
    }

    /// Render the response of the catalog endpoint.
    ///
    /// Entries keep the server order. In eager mode their previews are queued
    /// right away; the returned tickets are loads to start now.
    pub fn apply_fetch(&mut self, result: crate::Result<CatalogResponse>) -> Vec<LoadTicket> {
        self.scheduler.clear();
        self.entries.clear();
        self.handles.clear();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Catalog fetch failed: {}", e);
                let reason = match e {
                    CoreError::CatalogFetchFailed(reason) => reason,
                    other => other.to_string(),
                };
                self.status = CatalogStatus::Failed(reason);
                return Vec::new();
            }
        };

        info!("Catalog loaded with {} entries", response.videos.len());
        self.status = if response.videos.is_empty() {
            CatalogStatus::Empty
        } else {
            CatalogStatus::Ready
        };

        for entry in response.videos {
            self.handles.push(self.scheduler.register(entry.clone()));
            self.entries.push(entry);
        }

        match self.scheduler.mode() {
            VisibilityMode::Eager => self.scheduler.enqueue_all(),
            VisibilityMode::Observed => Vec::new(),
        }
    }

    /// The entry at `index` scrolled into view
    pub fn entry_visible(&mut self, index: usize) -> Vec<LoadTicket> {
        match self.handles.get(index) {
            Some(handle) => self.scheduler.on_visible(*handle),
            None => Vec::new(),
        }
    }

    /// Preview duration became known; returns the still-frame seek target
    pub fn thumbnail_duration(&mut self, ticket: &LoadTicket, duration: f64) -> Option<f64> {
        self.scheduler.on_duration_known(ticket, duration)
    }

    /// Preview load finished; returns the loads to start next
    pub fn thumbnail_finished(
        &mut self,
        ticket: &LoadTicket,
        outcome: LoadOutcome,
    ) -> Vec<LoadTicket> {
        self.scheduler.finish(ticket, outcome)
    }

    /// URL to load for a ticket
    pub fn thumbnail_url(&self, ticket: &LoadTicket) -> String {
        resolve_media_url(&self.origin, &crate::encode_path(&ticket.path))
    }

    /// The list was hidden; returns the preview resources to release
    pub fn suspend(&mut self) -> Vec<JobHandle> {
        self.scheduler.teardown()
    }

    /// The list is shown again
    pub fn resume(&mut self) -> Vec<LoadTicket> {
        self.scheduler.resume()
    }

    /// Entry with the given path
    pub fn find(&self, path: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Entries in server order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Current status
    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    /// Server origin used for media URLs
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The thumbnail scheduler
    pub fn scheduler(&self) -> &ThumbnailScheduler {
        &self.scheduler
    }
}
