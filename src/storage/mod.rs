//! Storage abstractions for crawl artifacts.
//!
//! ## Directory Structure
//!
//! ```text
//! output/
//! ├── content.txt           # Every article's text block, in input order
//! ├── texts/                # One text file per article: <seq>_<slug>.txt
//! ├── <slug>.html           # Offline page snapshot
//! ├── <slug>/               # Images referenced by that snapshot
//! ├── css/  js/             # Stylesheets and scripts shared by all snapshots
//! └── failed_downloads/     # One record per failed fetch
//! ```

pub mod failures;
pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AlbumListing, CrawlOutcome};

// Re-export for convenience
pub use failures::{FailureKind, FailureLog};
pub use local::LocalStorage;

/// Trait for crawl artifact backends.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Directory that relative artifact paths resolve against.
    fn root(&self) -> &Path;

    /// Persist a rewritten page as `<slug>.html`.
    async fn write_snapshot(&self, slug: &str, html: &str) -> Result<PathBuf>;

    /// Persist every outcome's text block into the consolidated file.
    async fn write_consolidated(&self, outcomes: &[CrawlOutcome]) -> Result<PathBuf>;

    /// Persist one text file per outcome that produced body text.
    async fn write_article_texts(&self, outcomes: &[CrawlOutcome]) -> Result<Vec<PathBuf>>;

    /// Persist the tabular export of a resolved album.
    async fn write_listing_export(&self, listing: &AlbumListing) -> Result<PathBuf>;
}
