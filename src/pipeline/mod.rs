// src/pipeline/mod.rs

//! Pipeline entry points for crawler operations.
//!
//! - `run_album`: Resolve an album into its article list and export it
//! - `run_crawler`: Crawl article URLs into the output directory
//! - `run_crop`, `run_shuffle`: Post-process downloaded images

pub mod album;
pub mod crawl;
pub mod postprocess;

pub use album::run_album;
pub use crawl::run_crawler;
pub use postprocess::{run_crop, run_shuffle};
