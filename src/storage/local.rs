//! Local filesystem storage implementation.
//!
//! Every write goes to a temporary sibling first and is renamed into place, so a
//! crash never leaves a truncated artifact behind.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AlbumListing, CrawlOutcome, OutputConfig};
use crate::storage::ArtifactStorage;
use crate::utils::fs::write_atomic;
use crate::utils::slugify;

/// Blank line appended after every block of the consolidated file.
const BLOCK_SEPARATOR: &str = "\r\n\r\n";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    text_file_name: String,
    text_dir_name: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, output: &OutputConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            text_file_name: output.text_file_name.clone(),
            text_dir_name: output.text_dir_name.clone(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn write_text(&self, path: PathBuf, text: &str) -> Result<PathBuf> {
        write_atomic(&path, text.as_bytes()).await?;
        Ok(path)
    }
}

/// Render a resolved album as CSV, newest entry numbered highest.
pub fn listing_csv(listing: &AlbumListing) -> String {
    let total = listing.articles.len();
    let mut out = String::from("序号,标题,地址\n");
    for article in &listing.articles {
        let _ = writeln!(
            out,
            "{},{},{}",
            total + 1 - article.index,
            csv_field(&article.title),
            csv_field(&article.url)
        );
    }
    out
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[async_trait]
impl ArtifactStorage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root_dir
    }

    async fn write_snapshot(&self, slug: &str, html: &str) -> Result<PathBuf> {
        self.write_text(self.path(&format!("{slug}.html")), html)
            .await
    }

    async fn write_consolidated(&self, outcomes: &[CrawlOutcome]) -> Result<PathBuf> {
        let mut text = String::new();
        for outcome in outcomes {
            text.push_str(&outcome.body_text);
            text.push_str(BLOCK_SEPARATOR);
        }
        self.write_text(self.path(&self.text_file_name), &text).await
    }

    async fn write_article_texts(&self, outcomes: &[CrawlOutcome]) -> Result<Vec<PathBuf>> {
        let dir = self.path(&self.text_dir_name);
        let mut written = Vec::new();

        for outcome in outcomes.iter().filter(|o| !o.body_text.is_empty()) {
            let slug = outcome
                .slug
                .clone()
                .unwrap_or_else(|| slugify(&outcome.title));
            let path = dir.join(format!("{}_{}.txt", outcome.sequence, slug));
            written.push(self.write_text(path, &outcome.body_text).await?);
        }

        Ok(written)
    }

    async fn write_listing_export(&self, listing: &AlbumListing) -> Result<PathBuf> {
        let name = format!(
            "{}_{}.csv",
            slugify(&listing.nickname),
            slugify(&listing.title)
        );
        self.write_text(self.path(&name), &listing_csv(listing)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleReference;
    use pretty_assertions::assert_eq;

    fn article(index: usize, title: &str, url: &str) -> ArticleReference {
        ArticleReference {
            index,
            title: title.into(),
            url: url.into(),
            message_id: index.to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_listing_csv_reverses_index_and_quotes() {
        let listing = AlbumListing {
            articles: vec![
                article(1, "Newest \"hot\"", "http://x/3"),
                article(2, "Middle", "http://x/2"),
                article(3, "Oldest", "http://x/1"),
            ],
            ..AlbumListing::default()
        };

        assert_eq!(
            listing_csv(&listing),
            "序号,标题,地址\n3,\"Newest \"\"hot\"\"\",\"http://x/3\"\n2,\"Middle\",\"http://x/2\"\n1,\"Oldest\",\"http://x/1\"\n"
        );
    }

    #[tokio::test]
    async fn test_text_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), &OutputConfig::default());

        let first = CrawlOutcome {
            body_text: "block one".into(),
            slug: Some("alpha".into()),
            ..CrawlOutcome::new(1, "https://x/1")
        };
        let skipped = CrawlOutcome::new(2, "https://x/2");
        let third = CrawlOutcome {
            body_text: "block three".into(),
            title: "Gamma Ray".into(),
            ..CrawlOutcome::new(3, "https://x/3")
        };
        let outcomes = vec![first, skipped, third];

        let consolidated = storage.write_consolidated(&outcomes).await.unwrap();
        assert_eq!(consolidated, dir.path().join("content.txt"));
        assert_eq!(
            std::fs::read_to_string(&consolidated).unwrap(),
            "block one\r\n\r\n\r\n\r\nblock three\r\n\r\n"
        );

        let files = storage.write_article_texts(&outcomes).await.unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("texts/1_alpha.txt"),
                dir.path().join("texts/3_Gamma_Ray.txt")
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_export_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), &OutputConfig::default());
        let listing = AlbumListing {
            nickname: "Daily Notes".into(),
            title: "Travel/2024".into(),
            articles: vec![article(1, "A", "http://x/1")],
            ..AlbumListing::default()
        };

        let path = storage.write_listing_export(&listing).await.unwrap();
        assert_eq!(path, dir.path().join("Daily_Notes_Travel_2024.csv"));
    }
}
