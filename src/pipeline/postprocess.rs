// src/pipeline/postprocess.rs

//! Image post-processing pipelines.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, CropReport, ShuffleReport};
use crate::services::{ImageCropper, ImageShuffler};
use crate::utils::log::{format_elapsed, header, summary};

/// Crop the bottom strip off every image under `dir`.
///
/// `bottom_pixels` overrides the configured strip height.
pub async fn run_crop(config: &Config, dir: &Path, bottom_pixels: Option<u32>) -> Result<CropReport> {
    let bottom = bottom_pixels.unwrap_or(config.postprocess.crop_bottom_pixels);
    header(&format!("Cropping {bottom}px from images in {}", dir.display()));

    let cropper = ImageCropper::new(bottom, config.postprocess.crop_concurrency);
    let report = cropper
        .crop_tree(dir)
        .await
        .map_err(|e| AppError::in_stage("crop", e))?;

    summary(
        "Crop",
        &[
            ("Attempted", report.attempted().to_string()),
            ("Succeeded", report.succeeded().to_string()),
            ("Elapsed", format_elapsed(report.elapsed)),
        ],
    );
    let errors = report.error_summary();
    if !errors.is_empty() {
        log::warn!("Failures:\n{errors}");
    }

    Ok(report)
}

/// Shuffle and split the image directories under `dir`.
///
/// `max_images` overrides the configured split threshold.
pub async fn run_shuffle(config: &Config, dir: &Path, max_images: Option<usize>) -> Result<ShuffleReport> {
    let max = max_images.unwrap_or(config.postprocess.shuffle_max_images);
    header(&format!("Shuffling images in {}", dir.display()));

    let shuffler = ImageShuffler::new(max);
    let root = dir.to_path_buf();
    let report = tokio::task::spawn_blocking(move || shuffler.shuffle_tree(&root))
        .await?
        .map_err(|e| AppError::in_stage("shuffle", e))?;

    summary(
        "Shuffle",
        &[
            ("Directories", report.directories.to_string()),
            ("Renamed", report.renamed.to_string()),
            ("Split", report.split.to_string()),
            ("Elapsed", format_elapsed(report.elapsed)),
        ],
    );
    if !report.errors.is_empty() {
        log::warn!("Failures:\n{}", report.errors.join(" | \n"));
    }

    Ok(report)
}
