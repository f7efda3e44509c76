// src/pipeline/album.rs

//! Album resolution pipeline.

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{AlbumListing, Config};
use crate::services::ListingResolver;
use crate::storage::{ArtifactStorage, LocalStorage};
use crate::utils::log::{header, sub_item, summary};

/// Resolve the album at `landing_url` and export its article list as CSV.
///
/// A failed export is logged; the listing is still returned.
pub async fn run_album(config: &Config, client: &Client, landing_url: &str) -> Result<AlbumListing> {
    header("Resolving album");

    let resolver = ListingResolver::new(client.clone(), config.listing.clone());
    let listing = resolver
        .resolve(landing_url)
        .await
        .map_err(|e| AppError::in_stage("listing", e))?;

    let storage = LocalStorage::new(&config.listing.export_dir, &config.output);
    match storage.write_listing_export(&listing).await {
        Ok(path) => sub_item(&format!("Article list exported to {}", path.display())),
        Err(e) => log::error!("Could not export article list: {e}"),
    }

    summary(
        &listing.title,
        &[
            ("Owner", listing.nickname.clone()),
            ("Declared", listing.declared_count.to_string()),
            ("Resolved", listing.articles.len().to_string()),
            ("Requests", listing.request_count.to_string()),
            ("Budget exhausted", listing.budget_exhausted.to_string()),
        ],
    );

    Ok(listing)
}
