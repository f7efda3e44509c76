//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and article crawling behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Resource download behavior
    #[serde(default)]
    pub downloader: DownloaderConfig,

    /// Album listing resolution
    #[serde(default)]
    pub listing: ListingConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Image crop and shuffle passes
    #[serde(default)]
    pub postprocess: PostprocessConfig,

    /// Logging defaults for the CLI
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.dispatch_delay_min_ms > self.crawler.dispatch_delay_max_ms {
            return Err(AppError::validation(
                "crawler.dispatch_delay_min_ms must not exceed dispatch_delay_max_ms",
            ));
        }
        if self.crawler.platform_domain.trim().is_empty() {
            return Err(AppError::validation("crawler.platform_domain is empty"));
        }
        if self.downloader.max_concurrent == 0 {
            return Err(AppError::validation("downloader.max_concurrent must be > 0"));
        }
        if self.listing.max_requests == 0 {
            return Err(AppError::validation("listing.max_requests must be > 0"));
        }
        if self.listing.page_size == 0 {
            return Err(AppError::validation("listing.page_size must be > 0"));
        }
        if self.postprocess.crop_concurrency == 0 {
            return Err(AppError::validation(
                "postprocess.crop_concurrency must be > 0",
            ));
        }
        Ok(())
    }
}

/// How extracted media URLs are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Images are downloaded while rewriting the page snapshot.
    #[default]
    Inline,
    /// The extracted media list is downloaded as one bounded batch.
    Batch,
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum articles processed at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Lower bound of the random pause between article dispatches
    #[serde(default = "defaults::dispatch_delay_min")]
    pub dispatch_delay_min_ms: u64,

    /// Upper bound of the random pause between article dispatches
    #[serde(default = "defaults::dispatch_delay_max")]
    pub dispatch_delay_max_ms: u64,

    #[serde(default)]
    pub media_mode: MediaMode,

    /// Host that article URLs must belong to
    #[serde(default = "defaults::platform_domain")]
    pub platform_domain: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            dispatch_delay_min_ms: defaults::dispatch_delay_min(),
            dispatch_delay_max_ms: defaults::dispatch_delay_max(),
            media_mode: MediaMode::default(),
            platform_domain: defaults::platform_domain(),
        }
    }
}

/// Resource download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Maximum simultaneous downloads in a bulk batch
    #[serde(default = "defaults::download_concurrency")]
    pub max_concurrent: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::download_concurrency(),
        }
    }
}

/// Album listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Hard cap on pagination requests per album
    #[serde(default = "defaults::max_requests")]
    pub max_requests: usize,

    /// Pause between pagination requests in milliseconds
    #[serde(default = "defaults::request_interval")]
    pub request_interval_ms: u64,

    /// Entries requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Directory receiving the CSV export of resolved listings
    #[serde(default = "defaults::export_dir")]
    pub export_dir: PathBuf,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::max_requests(),
            request_interval_ms: defaults::request_interval(),
            page_size: defaults::page_size(),
            export_dir: defaults::export_dir(),
        }
    }
}

/// Output locations for crawl artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for snapshots, assets and text files
    #[serde(default = "defaults::save_dir")]
    pub save_dir: PathBuf,

    /// File name of the consolidated text file
    #[serde(default = "defaults::text_file_name")]
    pub text_file_name: String,

    /// Subdirectory holding one text file per article
    #[serde(default = "defaults::text_dir_name")]
    pub text_dir_name: String,

    /// Subdirectory holding failure records
    #[serde(default = "defaults::failure_dir_name")]
    pub failure_dir_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_dir: defaults::save_dir(),
            text_file_name: defaults::text_file_name(),
            text_dir_name: defaults::text_dir_name(),
            failure_dir_name: defaults::failure_dir_name(),
        }
    }
}

/// Image post-processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostprocessConfig {
    /// Pixels removed from the bottom of every image
    #[serde(default = "defaults::crop_bottom_pixels")]
    pub crop_bottom_pixels: u32,

    #[serde(default = "defaults::crop_concurrency")]
    pub crop_concurrency: usize,

    /// Directories holding more images than this are split in two (0 disables)
    #[serde(default = "defaults::shuffle_max_images")]
    pub shuffle_max_images: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            crop_bottom_pixels: defaults::crop_bottom_pixels(),
            crop_concurrency: defaults::crop_concurrency(),
            shuffle_max_images: defaults::shuffle_max_images(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn dispatch_delay_min() -> u64 {
        1_000
    }
    pub fn dispatch_delay_max() -> u64 {
        10_000
    }
    pub fn platform_domain() -> String {
        "mp.weixin.qq.com".into()
    }

    // Downloader defaults
    pub fn download_concurrency() -> usize {
        10
    }

    // Listing defaults
    pub fn max_requests() -> usize {
        100
    }
    pub fn request_interval() -> u64 {
        2_000
    }
    pub fn page_size() -> usize {
        10
    }
    pub fn export_dir() -> PathBuf {
        PathBuf::from("downloads")
    }

    // Output defaults
    pub fn save_dir() -> PathBuf {
        PathBuf::from("output")
    }
    pub fn text_file_name() -> String {
        "content.txt".into()
    }
    pub fn text_dir_name() -> String {
        "texts".into()
    }
    pub fn failure_dir_name() -> String {
        "failed_downloads".into()
    }

    // Post-processing defaults
    pub fn crop_bottom_pixels() -> u32 {
        65
    }
    pub fn crop_concurrency() -> usize {
        10
    }
    pub fn shuffle_max_images() -> usize {
        20
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
