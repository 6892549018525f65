//! Browser client composition
//!
//! One catalog view, one player view and the single playback controller of
//! the page. Switching views suspends or resumes the thumbnail scheduler.

use crate::{
    location::parse_watch_fragment, CatalogView, DeferredSource, JobHandle, LoadTicket,
    MediaBackend, MediaEvent, PlaybackController, PlayerView, VisibilityMode,
};
use tracing::info;

/// Which view is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// The catalog list
    Catalog,
    /// The player
    Player,
}

/// Result of opening an entry
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedEntry {
    /// Source to assign on the next tick
    pub deferred: DeferredSource,
    /// Preview resources the host must release
    pub released_thumbnails: Vec<JobHandle>,
}

/// The browser page
pub struct BrowserClient<B: MediaBackend> {
    catalog: CatalogView,
    player: PlayerView,
    controller: PlaybackController<B>,
    view: ActiveView,
}

impl<B: MediaBackend> BrowserClient<B> {
    /// Create a client showing the catalog
    pub fn new(backend: B, origin: &str, concurrency: usize, mode: VisibilityMode) -> Self {
        Self {
            catalog: CatalogView::new(origin, concurrency, mode),
            player: PlayerView::new(origin),
            controller: PlaybackController::new(backend),
            view: ActiveView::Catalog,
        }
    }

    /// Page load. A `#/watch<path>` fragment opens that entry directly.
    pub fn start(&mut self, fragment: Option<&str>) -> Option<OpenedEntry> {
        let path = fragment.and_then(parse_watch_fragment)?;
        info!("Restoring deep link to {}", path);
        Some(self.open_entry(&path))
    }

    /// Open a catalog entry in the player
    pub fn open_entry(&mut self, path: &str) -> OpenedEntry {
        let released_thumbnails = self.catalog.suspend();
        let deferred = self.player.open(path, &mut self.controller);
        self.view = ActiveView::Player;
        OpenedEntry {
            deferred,
            released_thumbnails,
        }
    }

    /// Next tick after [`open_entry`](Self::open_entry)
    pub fn assign_source(&mut self, deferred: &DeferredSource) -> bool {
        self.player.assign_source(deferred, &mut self.controller)
    }

    /// Back to the list; returns preview loads to start
    pub fn back_to_list(&mut self) -> Vec<LoadTicket> {
        self.player.close(&mut self.controller);
        self.view = ActiveView::Catalog;
        self.catalog.resume()
    }

    /// Media event of the player surface
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        self.player.handle_media_event(event, &mut self.controller);
    }

    /// Current shareable fragment
    pub fn location(&self) -> Option<&str> {
        self.player.fragment()
    }

    /// Shown view
    pub fn view(&self) -> ActiveView {
        self.view
    }

    /// The catalog view
    pub fn catalog(&self) -> &CatalogView {
        &self.catalog
    }

    /// Mutable access to the catalog view
    pub fn catalog_mut(&mut self) -> &mut CatalogView {
        &mut self.catalog
    }

    /// The player view
    pub fn player(&self) -> &PlayerView {
        &self.player
    }

    /// The player view together with the controller it drives
    pub fn player_mut(&mut self) -> (&mut PlayerView, &mut PlaybackController<B>) {
        (&mut self.player, &mut self.controller)
    }

    /// The playback controller
    pub fn controller(&self) -> &PlaybackController<B> {
        &self.controller
    }
}
