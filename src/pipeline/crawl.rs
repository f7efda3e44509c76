// src/pipeline/crawl.rs

//! Article crawling pipeline.

use std::path::Path;
use std::sync::Arc;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlReport};
use crate::services::ArticleCrawler;
use crate::storage::LocalStorage;
use crate::utils::log::{format_elapsed, header, summary};

/// Crawl `urls` into `output_dir`.
///
/// Partial failures stay on the report; only losing the text artifacts fails
/// the stage.
pub async fn run_crawler(
    config: &Config,
    client: &Client,
    urls: &[String],
    output_dir: &Path,
) -> Result<CrawlReport> {
    header(&format!("Crawling {} articles", urls.len()));

    let storage = Arc::new(LocalStorage::new(output_dir, &config.output));
    let crawler = ArticleCrawler::new(config, client.clone(), storage);
    let report = crawler
        .crawl(urls)
        .await
        .map_err(|e| AppError::in_stage("crawl", e))?;

    let mut items = vec![
        ("Attempted", report.attempted().to_string()),
        ("Succeeded", report.succeeded().to_string()),
        ("Media URLs", report.media_count().to_string()),
        ("Article files", report.article_files.len().to_string()),
        ("Elapsed", format_elapsed(report.elapsed)),
    ];
    if let Some(path) = &report.consolidated_path {
        items.push(("Consolidated", path.display().to_string()));
    }
    summary("Crawl", &items);

    let errors = report.error_summary();
    if !errors.is_empty() {
        log::warn!("Failures:\n{errors}");
    }

    Ok(report)
}
