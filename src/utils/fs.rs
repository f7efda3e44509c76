// src/utils/fs.rs

//! Filesystem helpers shared by storage, downloads and post-processing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::utils::url::filter_platform_urls;

/// Write bytes atomically (write to a temporary sibling, then rename).
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_sibling(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Temporary path next to `path`, used while a write is in flight.
///
/// Every call yields a fresh name, so concurrent writers of one target never
/// share a temporary file; the last rename wins.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{:08x}.part", rand::random::<u32>()));
    path.with_file_name(name)
}

/// Every regular file below `root`, recursively, in sorted order.
pub fn collect_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, &mut |path, is_dir| {
        if !is_dir {
            files.push(path.to_path_buf());
        }
    })?;
    files.sort();
    Ok(files)
}

/// `root` and every directory below it, in sorted order.
pub fn collect_dirs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = vec![root.to_path_buf()];
    walk(root, &mut |path, is_dir| {
        if is_dir {
            dirs.push(path.to_path_buf());
        }
    })?;
    dirs.sort();
    Ok(dirs)
}

fn walk(dir: &Path, visit: &mut dyn FnMut(&Path, bool)) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            visit(&path, true);
            walk(&path, visit)?;
        } else if file_type.is_file() {
            visit(&path, false);
        }
    }
    Ok(())
}

/// Read a newline-delimited URL list, keeping only platform article URLs.
///
/// Blank lines are skipped silently; other rejected lines are logged.
pub fn read_url_list(path: &Path, platform_domain: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(filter_platform_urls(content.lines(), platform_domain))
}
