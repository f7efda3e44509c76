// src/storage/failures.rs

//! One small text record per failed fetch, for later manual retry.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};

use crate::utils::fs::write_atomic;

/// What kind of fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Article,
    Resource,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Article => "文章",
            Self::Resource => "资源文件",
        }
    }
}

/// Directory of failure records.
#[derive(Debug, Clone)]
pub struct FailureLog {
    dir: PathBuf,
}

impl FailureLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name for a failure of `url` observed at `at`.
    pub fn record_name(url: &str, at: &DateTime<Local>) -> String {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        format!("{}_{}.txt", at.format("%Y%m%d_%H%M%S"), &digest[..8])
    }

    /// Write a record. Failures to write are logged, never returned.
    pub async fn record(&self, kind: FailureKind, url: &str, error: &str) -> Option<PathBuf> {
        let now = Local::now();
        let path = self.dir.join(Self::record_name(url, &now));
        let body = format!(
            "类型: {}\nURL: {}\nError: {}\nTimestamp: {}\n",
            kind.label(),
            url,
            error,
            now.format("%Y-%m-%d %H:%M:%S")
        );

        match write_atomic(&path, body.as_bytes()).await {
            Ok(()) => {
                log::debug!("Failure recorded at {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::error!("Could not record failure for {url}: {e}");
                None
            }
        }
    }
}
