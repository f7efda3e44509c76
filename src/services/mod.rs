// src/services/mod.rs

//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Album listing resolution (`ListingResolver`)
//! - Embedded literal recovery (`normalizer`)
//! - Article extraction and page rewriting (`extractor`, `rewriter`)
//! - Resource downloads (`ResourceDownloader`)
//! - Concurrent article crawling (`ArticleCrawler`)
//! - Image post-processing (`ImageCropper`, `ImageShuffler`)

pub mod crawler;
pub mod cropper;
pub mod downloader;
pub mod extractor;
pub mod listing;
pub mod normalizer;
pub mod rewriter;
pub mod shuffler;

pub use crawler::ArticleCrawler;
pub use cropper::ImageCropper;
pub use downloader::{ResourceDownloader, SavedMedia};
pub use listing::ListingResolver;
pub use shuffler::ImageShuffler;
