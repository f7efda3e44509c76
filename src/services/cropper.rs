// src/services/cropper.rs

//! Bottom-strip cropping for every image below a directory.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::error::{AppError, Result};
use crate::models::{CropOutcome, CropReport};
use crate::utils::fs::{collect_files, temp_sibling};

/// Bytes inspected to decide whether a file is an image.
const SNIFF_LEN: u64 = 512;

/// Crops a fixed strip off the bottom of images, in place.
#[derive(Debug, Clone)]
pub struct ImageCropper {
    bottom_pixels: u32,
    concurrency: usize,
}

impl ImageCropper {
    pub fn new(bottom_pixels: u32, concurrency: usize) -> Self {
        Self {
            bottom_pixels,
            concurrency: concurrency.max(1),
        }
    }

    /// Crop every image file below `root`. Non-image files are skipped silently.
    ///
    /// Fails only if the directory walk itself fails; per-file problems are
    /// reported on the outcomes.
    pub async fn crop_tree(&self, root: &Path) -> Result<CropReport> {
        let start = Instant::now();
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&walk_root)).await??;
        log::info!("Scanning {} files under {}", files.len(), root.display());

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut jobs = Vec::with_capacity(files.len());
        for path in files {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| AppError::Task(e.to_string()))?;
            let bottom = self.bottom_pixels;
            let job_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                crop_file(&job_path, bottom)
            });
            jobs.push((path, handle));
        }

        let mut outcomes = Vec::new();
        for (path, handle) in jobs {
            let error = match handle.await {
                Ok(Ok(true)) => None,
                Ok(Ok(false)) => continue,
                Ok(Err(e)) => Some(e),
                Err(e) => Some(e.into()),
            };
            if let Some(e) = &error {
                log::warn!("Crop failed: {e}");
            }
            outcomes.push(CropOutcome { path, error });
        }

        Ok(CropReport {
            outcomes,
            elapsed: start.elapsed(),
        })
    }
}

/// Crop `bottom` pixels off one file in place.
///
/// Returns `Ok(false)` when the file is not a recognizable image.
pub fn crop_file(path: &Path, bottom: u32) -> Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    let Ok(format) = image::guess_format(&head) else {
        return Ok(false);
    };

    let bytes = fs::read(path)?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| AppError::crop(path, e))?;

    let (width, height) = (img.width(), img.height());
    if height <= bottom {
        return Err(AppError::crop(
            path,
            format!("crop height must be less than image height ({bottom} >= {height})"),
        ));
    }

    let cropped = img.crop_imm(0, 0, width, height - bottom);
    let tmp: PathBuf = temp_sibling(path);
    if let Err(e) = cropped.save_with_format(&tmp, format) {
        let _ = fs::remove_file(&tmp);
        return Err(AppError::crop(path, e));
    }
    fs::rename(&tmp, path)?;
    Ok(true)
}
