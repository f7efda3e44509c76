// src/services/shuffler.rs

//! Shuffle and redistribute image sets.
//!
//! Every directory below the root is handled on its own: its images get random
//! positional names, and a directory holding more than the configured maximum is
//! split into two halves. Renames go through unique temporary names first, so a
//! final name never clobbers a sibling that is still waiting to be renamed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::error::Result;
use crate::models::ShuffleReport;
use crate::utils::fs::collect_dirs;

static IMAGE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif)$").expect("valid regex"));

/// Renames and splits image directories.
#[derive(Debug, Clone)]
pub struct ImageShuffler {
    /// Split threshold; zero disables splitting
    max_images: usize,
}

impl ImageShuffler {
    pub fn new(max_images: usize) -> Self {
        Self { max_images }
    }

    /// Shuffle every directory below `root`, `root` included.
    ///
    /// Blocking; run it on a blocking thread from async code. Individual rename
    /// or move failures are collected on the report.
    pub fn shuffle_tree(&self, root: &Path) -> Result<ShuffleReport> {
        let start = Instant::now();
        let mut report = ShuffleReport::default();

        for dir in collect_dirs(root)? {
            let images = match list_images(&dir) {
                Ok(images) => images,
                Err(e) => {
                    report.errors.push(format!("{}: {e}", dir.display()));
                    continue;
                }
            };
            if images.len() <= 1 {
                continue;
            }

            report.directories += 1;
            let renamed = rename_shuffled(&dir, images, &mut report.errors);
            report.renamed += renamed.len();
            log::debug!("Shuffled {} images in {}", renamed.len(), dir.display());

            if self.max_images > 0
                && renamed.len() > self.max_images
                && split_in_half(&dir, renamed, &mut report.errors)
            {
                report.split += 1;
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }
}

/// Image files directly inside `dir`, sorted by path.
fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if IMAGE_EXT.is_match(&entry.file_name().to_string_lossy()) {
            images.push(entry.path());
        }
    }
    images.sort();
    Ok(images)
}

/// Extension of `path` including the dot, as written on disk.
fn extension_of(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    IMAGE_EXT
        .find(&name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Give every image a `<position>_<random><ext>` name. Returns the final paths.
fn rename_shuffled(dir: &Path, mut images: Vec<PathBuf>, errors: &mut Vec<String>) -> Vec<PathBuf> {
    let mut rng = rand::rng();
    images.shuffle(&mut rng);

    // First phase: move everything out of the way.
    let mut staged = Vec::with_capacity(images.len());
    for (i, path) in images.into_iter().enumerate() {
        let position = i + 1;
        let ext = extension_of(&path);
        let tmp = dir.join(format!(".shuffle-{position}-{}.tmp", rng.random::<u32>()));
        match fs::rename(&path, &tmp) {
            Ok(()) => staged.push((position, tmp, ext)),
            Err(e) => errors.push(format!("{}: {e}", path.display())),
        }
    }

    // Second phase: final names.
    let mut renamed = Vec::with_capacity(staged.len());
    for (position, tmp, ext) in staged {
        let target = dir.join(format!("{position}_{}{ext}", rng.random_range(1..=100u32)));
        match fs::rename(&tmp, &target) {
            Ok(()) => renamed.push(target),
            Err(e) => errors.push(format!("{}: {e}", tmp.display())),
        }
    }
    renamed
}

/// Move the sorted first half into `<count>_1` and the rest into `<count>_2`.
fn split_in_half(dir: &Path, mut files: Vec<PathBuf>, errors: &mut Vec<String>) -> bool {
    let count = files.len();
    files.sort();
    let first = dir.join(format!("{count}_1"));
    let second = dir.join(format!("{count}_2"));
    for target in [&first, &second] {
        if let Err(e) = fs::create_dir_all(target) {
            errors.push(format!("{}: {e}", target.display()));
            return false;
        }
    }

    let half = count / 2;
    for (i, file) in files.iter().enumerate() {
        let target_dir = if i < half { &first } else { &second };
        let Some(name) = file.file_name() else {
            continue;
        };
        if let Err(e) = fs::rename(file, target_dir.join(name)) {
            errors.push(format!("{}: {e}", file.display()));
        }
    }
    log::info!("Split {} images of {} into two halves", count, dir.display());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(dir: &Path, count: usize) {
        for i in 0..count {
            fs::write(dir.join(format!("img{i:02}.jpg")), format!("{i}")).unwrap();
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_renames_without_split_under_max() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), 5);
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let report = ImageShuffler::new(20).shuffle_tree(dir.path()).unwrap();

        assert_eq!(report.directories, 1);
        assert_eq!(report.renamed, 5);
        assert_eq!(report.split, 0);
        assert!(report.errors.is_empty());

        let names = file_names(dir.path());
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"notes.txt".to_string()));
        let pattern = Regex::new(r"^[1-5]_([1-9][0-9]?|100)\.jpg$").unwrap();
        let images: Vec<_> = names.iter().filter(|n| n.ends_with(".jpg")).collect();
        assert_eq!(images.len(), 5);
        assert!(images.iter().all(|n| pattern.is_match(n)));

        // The file content moved with the file
        let mut contents: Vec<String> = images
            .iter()
            .map(|n| fs::read_to_string(dir.path().join(n)).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_splits_over_max() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), 7);

        let report = ImageShuffler::new(4).shuffle_tree(dir.path()).unwrap();

        assert_eq!(report.split, 1);
        assert!(file_names(dir.path()).is_empty());
        let first = file_names(&dir.path().join("7_1"));
        let second = file_names(&dir.path().join("7_2"));
        assert!(!first.is_empty());
        assert!(!second.is_empty());
        assert_eq!(first.len() + second.len(), 7);
    }

    #[test]
    fn test_single_image_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("one")).unwrap();
        fs::write(dir.path().join("one/cover.PNG"), "x").unwrap();

        let report = ImageShuffler::new(1).shuffle_tree(dir.path()).unwrap();

        assert_eq!(report.directories, 0);
        assert_eq!(file_names(&dir.path().join("one")), vec!["cover.PNG"]);
    }

    #[test]
    fn test_extension_keeps_case() {
        assert_eq!(extension_of(Path::new("/a/B.JPEG")), ".JPEG");
        assert_eq!(extension_of(Path::new("/a/readme")), "");
    }
}
