// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod album;
mod config;
mod outcome;

// Re-export all public types
pub use album::{
    AlbumEntry, AlbumListing, AlbumPage, AlbumPageBody, ArticleReference, BaseResponse,
    LandingData,
};
pub use config::{
    Config, CrawlerConfig, DownloaderConfig, ListingConfig, LoggingConfig, MediaMode,
    OutputConfig, PostprocessConfig,
};
pub use outcome::{
    CrawlOutcome, CrawlReport, CropOutcome, CropReport, ShuffleReport, UNTITLED,
};
