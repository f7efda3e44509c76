// src/lib.rs

//! Graph Crawler Library
//!
//! Resolves platform article albums, crawls articles into offline snapshots and
//! text files, and post-processes the downloaded images.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
