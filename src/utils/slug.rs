// src/utils/slug.rs

//! Filesystem-safe names derived from article titles.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Longest slug produced, counted in grapheme clusters.
pub const MAX_SLUG_LEN: usize = 100;

/// Name used when a title reduces to nothing.
const FALLBACK: &str = "untitled";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_.\p{Han}]+").expect("valid regex"));

/// Reduce a title to a slug safe for use as a file or directory name.
///
/// Runs of characters outside ASCII alphanumerics, `-`, `_`, `.` and Han
/// ideographs collapse into a single `_`.
pub fn slugify(title: &str) -> String {
    let replaced = UNSAFE_RUN.replace_all(title.trim(), "_");
    let capped: String = replaced.graphemes(true).take(MAX_SLUG_LEN).collect();

    // A bare run of dots would name the current or parent directory.
    if capped.chars().all(|c| c == '.' || c == '_') {
        return FALLBACK.to_string();
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_keeps_han_and_ascii() {
        assert_eq!(slugify("春天 的 故事: Part 1/2"), "春天_的_故事_Part_1_2");
        assert_eq!(slugify("report-v1.2_final"), "report-v1.2_final");
    }

    #[test]
    fn test_slugify_caps_length() {
        let title = "字".repeat(150);
        assert_eq!(slugify(&title).chars().count(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_slugify_degenerate_titles() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify(".."), "untitled");
        assert_eq!(slugify("!!!"), "untitled");
    }
}
