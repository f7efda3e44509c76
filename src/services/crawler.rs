// src/services/crawler.rs

//! Article crawler service.
//!
//! Every input URL gets its own worker task. Dispatch is paced by a random
//! delay and capped by a semaphore; results travel back over a channel sized to
//! the input, so no worker ever blocks on sending. Once every worker has been
//! joined the outcomes are sorted back into input order and the text artifacts
//! are written.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::Client;
use tokio::sync::{Semaphore, mpsc};

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlOutcome, CrawlReport, CrawlerConfig, MediaMode};
use crate::services::downloader::ResourceDownloader;
use crate::services::extractor;
use crate::services::rewriter::{self, Rewrites};
use crate::storage::{ArtifactStorage, FailureKind, FailureLog};
use crate::utils::http::fetch_text;
use crate::utils::slugify;

/// State shared by every worker of a run.
struct CrawlContext {
    client: Client,
    downloader: ResourceDownloader,
    storage: Arc<dyn ArtifactStorage>,
    failures: FailureLog,
    output_dir: PathBuf,
    media_mode: MediaMode,
}

/// Service for crawling article pages into offline artifacts.
pub struct ArticleCrawler {
    ctx: Arc<CrawlContext>,
    settings: CrawlerConfig,
}

impl ArticleCrawler {
    /// Create a crawler writing into `storage`'s root directory.
    pub fn new(config: &Config, client: Client, storage: Arc<dyn ArtifactStorage>) -> Self {
        let output_dir = storage.root().to_path_buf();
        let failures = FailureLog::new(output_dir.join(&config.output.failure_dir_name));
        let downloader = ResourceDownloader::new(
            client.clone(),
            &output_dir,
            failures.clone(),
            config.downloader.max_concurrent,
        );

        Self {
            ctx: Arc::new(CrawlContext {
                client,
                downloader,
                storage,
                failures,
                output_dir,
                media_mode: config.crawler.media_mode,
            }),
            settings: config.crawler.clone(),
        }
    }

    /// Crawl every URL and write the consolidated and per-article text files.
    ///
    /// Per-article problems are recorded on the outcomes; only failing to write
    /// the final artifacts is an error.
    pub async fn crawl(&self, urls: &[String]) -> Result<CrawlReport> {
        let start = Instant::now();
        let total = urls.len();
        let (tx, mut rx) = mpsc::channel(total.max(1));
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        let mut workers = Vec::with_capacity(total);

        for (i, url) in urls.iter().enumerate() {
            let pause = self.dispatch_delay();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| AppError::Task(e.to_string()))?;
            let ctx = Arc::clone(&self.ctx);
            let tx = tx.clone();
            let sequence = i + 1;
            let target = url.clone();

            log::info!("[{sequence}/{total}] Dispatching {target}");
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = ctx.crawl_article(sequence, target).await;
                // The receiver outlives every worker.
                let _ = tx.send(outcome).await;
            });
            workers.push((sequence, url.clone(), handle));
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        for (sequence, url, handle) in workers {
            if let Err(e) = handle.await {
                log::error!("Worker for #{sequence} {url} aborted: {e}");
                outcomes.push(CrawlOutcome {
                    error: Some(e.into()),
                    ..CrawlOutcome::new(sequence, url)
                });
            }
        }
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.sequence);

        let consolidated = self.ctx.storage.write_consolidated(&outcomes).await?;
        let article_files = self.ctx.storage.write_article_texts(&outcomes).await?;

        Ok(CrawlReport {
            outcomes,
            consolidated_path: Some(consolidated),
            article_files,
            elapsed: start.elapsed(),
        })
    }

    fn dispatch_delay(&self) -> Duration {
        let low = self.settings.dispatch_delay_min_ms;
        let high = self.settings.dispatch_delay_max_ms.max(low);
        if high == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(low..=high))
    }
}

impl CrawlContext {
    async fn crawl_article(&self, sequence: usize, url: String) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::new(sequence, &url);

        let html = match fetch_text(&self.client, &url).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("#{sequence} fetch failed: {e}");
                self.failures
                    .record(FailureKind::Article, &url, &e.to_string())
                    .await;
                outcome.error = Some(e);
                return outcome;
            }
        };

        outcome.media_urls = extractor::media_urls(&html);

        match extractor::article_meta(&html) {
            Some(meta) => {
                let slug = slugify(&meta.title);
                match self.save_snapshot(&html, &slug).await {
                    Ok(files) => outcome.saved_files.extend(files),
                    Err(e) => log::error!("#{sequence} snapshot not saved: {e}"),
                }

                let body = extractor::body_text(&html);
                outcome.body_text = extractor::format_article(sequence, &meta, &body);
                outcome.title = meta.title;
                outcome.slug = Some(slug);
            }
            None => log::warn!("#{sequence} {url} has no title/description meta, body skipped"),
        }

        if self.media_mode == MediaMode::Batch && !outcome.media_urls.is_empty() {
            let dir = self.output_dir.join(sequence.to_string());
            match self.downloader.download_batch(&outcome.media_urls, &dir).await {
                Ok(saved) => outcome
                    .saved_files
                    .extend(saved.into_iter().map(|m| m.path)),
                Err(e) => outcome.error = Some(e),
            }
        }

        log::info!(
            "#{sequence} done: {} media, {} files",
            outcome.media_urls.len(),
            outcome.saved_files.len()
        );
        outcome.raw_html = html;
        outcome
    }

    /// Download what the page references and persist the rewritten snapshot.
    async fn save_snapshot(&self, html: &str, slug: &str) -> Result<Vec<PathBuf>> {
        let refs = rewriter::collect_references(html);
        let mut rewrites = Rewrites::default();
        let mut saved = Vec::new();

        for image in refs.images {
            let relative = format!("{slug}/{}.jpeg", image.ordinal);
            let target = self.output_dir.join(&relative);
            if let Ok(path) = self.downloader.download(&image.url, &target).await {
                rewrites.images.insert(image.ordinal, relative);
                saved.push(path);
            }
        }

        for asset in refs.assets {
            if let Ok(relative) = self.downloader.download_shared(&asset.url, asset.kind).await {
                rewrites.assets.insert(asset.raw, relative);
            }
        }

        let page = rewriter::apply(html, &rewrites, slug);
        saved.push(self.storage.write_snapshot(slug, &page).await?);
        Ok(saved)
    }
}
