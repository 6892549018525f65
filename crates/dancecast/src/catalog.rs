//! `catalog` command: list the server's videos with their links

use anyhow::{bail, Context, Result};
use dancecast_control::{parse_origin, CatalogClient};
use dancecast_core::{watch_fragment, CatalogStatus, CatalogView, ClientConfig, VisibilityMode};

pub async fn run(config: &ClientConfig) -> Result<()> {
    let origin = parse_origin(&config.server).context("Invalid server origin")?;
    let client = CatalogClient::new(origin).context("Failed to build HTTP client")?;

    let mut view = CatalogView::new(
        client.origin(),
        config.thumbnail_concurrency,
        VisibilityMode::Observed,
    );
    view.begin_fetch();
    view.apply_fetch(client.fetch_for_view().await);

    println!("{}", view.status().display_text());
    if let CatalogStatus::Failed(reason) = view.status() {
        bail!("Catalog unavailable: {}", reason);
    }

    for entry in view.entries() {
        println!("{}", entry.name);
        println!("    {}", entry.media_url(view.origin()));
        println!("    {}/{}", view.origin(), watch_fragment(&entry.path));
    }
    Ok(())
}
