// src/models/outcome.rs

//! Per-item outcomes and run-level reports.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Default title for articles whose page carries no title meta.
pub const UNTITLED: &str = "未命名标题";

/// Result of crawling a single article URL.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub source_url: String,
    /// 1-based position in the input list
    pub sequence: usize,
    pub title: String,
    /// Filesystem-safe form of the title, absent when the page had no title meta
    pub slug: Option<String>,
    pub raw_html: String,
    pub media_urls: Vec<String>,
    /// Formatted text block, empty when body extraction was skipped or failed
    pub body_text: String,
    /// Files produced for this article (snapshot, images)
    pub saved_files: Vec<PathBuf>,
    pub error: Option<AppError>,
}

impl CrawlOutcome {
    /// Create an empty outcome for a URL about to be crawled.
    pub fn new(sequence: usize, source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            sequence,
            title: UNTITLED.to_string(),
            slug: None,
            raw_html: String::new(),
            media_urls: Vec::new(),
            body_text: String::new(),
            saved_files: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Outcomes sorted by sequence number
    pub outcomes: Vec<CrawlOutcome>,
    pub consolidated_path: Option<PathBuf>,
    pub article_files: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Total media references found across all articles.
    pub fn media_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.media_urls.len()).sum()
    }

    /// Every per-article error joined into one string.
    pub fn error_summary(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.error
                    .as_ref()
                    .map(|e| format!("#{} {}: {}", o.sequence, o.source_url, e))
            })
            .collect::<Vec<_>>()
            .join(" | \n")
    }
}

/// Result of cropping a single image file.
#[derive(Debug)]
pub struct CropOutcome {
    pub path: PathBuf,
    pub error: Option<AppError>,
}

/// Aggregate of a crop pass.
#[derive(Debug, Default)]
pub struct CropReport {
    pub outcomes: Vec<CropOutcome>,
    pub elapsed: Duration,
}

impl CropReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn error_summary(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| e.to_string()))
            .collect::<Vec<_>>()
            .join(" | \n")
    }
}

/// Aggregate of a shuffle pass.
#[derive(Debug, Default)]
pub struct ShuffleReport {
    /// Directories that held more than one image
    pub directories: usize,
    pub renamed: usize,
    /// Directories split into two halves
    pub split: usize,
    pub errors: Vec<String>,
    pub elapsed: Duration,
}
