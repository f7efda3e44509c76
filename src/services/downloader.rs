// src/services/downloader.rs

//! Resource downloader.
//!
//! Three entry points share one client and one failure log:
//! - [`ResourceDownloader::download`] fetches a URL to a target path, skipping
//!   targets that already exist
//! - [`ResourceDownloader::download_shared`] fetches stylesheets and scripts at
//!   most once per run, under a canonical name shared by every article
//! - [`ResourceDownloader::download_batch`] fetches a list of images with a
//!   bounded number in flight

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Semaphore};

use crate::error::{AppError, Result};
use crate::services::rewriter::AssetKind;
use crate::storage::{FailureKind, FailureLog};
use crate::utils::fs::temp_sibling;
use crate::utils::url::shared_asset_name;

/// An image saved by a batch download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMedia {
    /// 1-based position in the requested list
    pub index: usize,
    pub path: PathBuf,
}

/// Downloads page resources into an output tree.
pub struct ResourceDownloader {
    client: Client,
    root: PathBuf,
    failures: FailureLog,
    max_concurrent: usize,
    /// Shared resource URL to its path relative to `root`
    shared: Mutex<HashMap<String, String>>,
}

impl ResourceDownloader {
    pub fn new(
        client: Client,
        root: impl Into<PathBuf>,
        failures: FailureLog,
        max_concurrent: usize,
    ) -> Self {
        Self {
            client,
            root: root.into(),
            failures,
            max_concurrent: max_concurrent.max(1),
            shared: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch `url` into `target`. An existing target counts as already downloaded.
    pub async fn download(&self, url: &str, target: &Path) -> Result<PathBuf> {
        match self.fetch_to(url, target).await {
            Ok(()) => Ok(target.to_path_buf()),
            Err(e) => {
                log::warn!("Download failed for {url}: {e}");
                self.failures
                    .record(FailureKind::Resource, url, &e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    async fn fetch_to(&self, url: &str, target: &Path) -> Result<()> {
        if tokio::fs::try_exists(target).await? {
            log::debug!("Already present, skipping {}", target.display());
            return Ok(());
        }

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_sibling(target);
        let streamed = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<_, AppError>(())
        }
        .await;

        if let Err(e) = streamed {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp, target).await?;
        Ok(())
    }

    /// Fetch a stylesheet or script once per run and return its relative path.
    ///
    /// The cache lock is held across the download, so concurrent articles asking
    /// for the same URL wait for the first fetch instead of repeating it.
    pub async fn download_shared(&self, url: &str, kind: AssetKind) -> Result<String> {
        let mut cache = self.shared.lock().await;
        if let Some(relative) = cache.get(url) {
            return Ok(relative.clone());
        }

        let name = shared_asset_name(url)
            .ok_or_else(|| AppError::parse(format!("no file name in resource URL {url}")))?;
        let relative = format!("{}/{}", kind.dir(), name);

        self.download(url, &self.root.join(&relative)).await?;
        cache.insert(url.to_string(), relative.clone());
        Ok(relative)
    }

    /// Number of shared resources resolved so far.
    pub async fn shared_count(&self) -> usize {
        self.shared.lock().await.len()
    }

    /// Fetch every URL into `dir` as `<n>.jpeg`, at most `max_concurrent` at a time.
    ///
    /// Returns the saved files ordered by position, or one combined error naming
    /// every failed URL.
    pub async fn download_batch(&self, urls: &[String], dir: &Path) -> Result<Vec<SavedMedia>> {
        let permits = Semaphore::new(self.max_concurrent);

        let mut pending: FuturesUnordered<_> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let permits = &permits;
                async move {
                    let index = i + 1;
                    let Ok(_permit) = permits.acquire().await else {
                        let closed = AppError::Task("download permits closed".into());
                        return (index, url, Err(closed));
                    };
                    let target = dir.join(format!("{index}.jpeg"));
                    (index, url, self.download(url, &target).await)
                }
            })
            .collect();

        let mut saved = Vec::with_capacity(urls.len());
        let mut failed = Vec::new();
        while let Some((index, url, result)) = pending.next().await {
            match result {
                Ok(path) => saved.push(SavedMedia { index, path }),
                Err(e) => failed.push(format!("{url}: {e}")),
            }
        }

        if !failed.is_empty() {
            return Err(AppError::Batch {
                failed: failed.len(),
                message: failed.join(" | "),
            });
        }
        saved.sort_by_key(|m| m.index);
        Ok(saved)
    }
}
