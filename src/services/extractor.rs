// src/services/extractor.rs

//! Article page extraction: media list, title/description meta, body text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::services::normalizer::{locate_assignment, normalize_value};
use crate::utils::unescape_html;

/// Script variable listing the article's pictures.
pub const MEDIA_MARKER: &str = "window.picture_page_info_list";

static TITLE_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static DESCRIPTION_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));
static ARTICLE_ROOT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#js_article").expect("valid selector"));
static SECTION_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section").expect("valid selector"));
static SPAN_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));

static WATERMARK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"watermark_info\s*:\s*\{[^{}]*\}").expect("valid regex"));
static CDN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"cdn_url\s*:\s*(?:'([^']+)'|"([^"]+)")"#).expect("valid regex")
});

/// Title and description read from the page meta tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: String,
    pub description: String,
}

/// Picture URLs listed by the page, watermark variants excluded.
pub fn media_urls(html: &str) -> Vec<String> {
    let Some(literal) = locate_assignment(html, MEDIA_MARKER) else {
        return Vec::new();
    };

    match normalize_value(literal) {
        Ok(value) => {
            let mut urls = Vec::new();
            collect_cdn_urls(&value, &mut urls);
            urls
        }
        Err(e) => {
            log::debug!("Media list did not normalize ({e}), scanning text instead");
            scan_cdn_urls(literal)
        }
    }
}

fn collect_cdn_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_cdn_urls(item, out)),
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("watermark_info", _) => {}
                    ("cdn_url", Value::String(url)) if !url.trim().is_empty() => {
                        out.push(unescape_html(url.trim()));
                    }
                    _ => collect_cdn_urls(child, out),
                }
            }
        }
        _ => {}
    }
}

fn scan_cdn_urls(literal: &str) -> Vec<String> {
    let without_watermarks = WATERMARK_BLOCK.replace_all(literal, "");
    CDN_URL
        .captures_iter(&without_watermarks)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| unescape_html(m.as_str().trim()))
        .collect()
}

/// Title and description meta, or `None` if either tag is absent or the title is blank.
pub fn article_meta(html: &str) -> Option<ArticleMeta> {
    let document = Html::parse_document(html);
    let content = |selector: &Selector| {
        document
            .select(selector)
            .find_map(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
    };

    let title = content(&TITLE_META).filter(|t| !t.is_empty())?;
    let description = content(&DESCRIPTION_META)?;
    Some(ArticleMeta { title, description })
}

/// Text of the article container's elements, one per line: every `section`
/// first, then every `span`, each group in document order.
pub fn body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Some(root) = document.select(&ARTICLE_ROOT).next() else {
        return String::new();
    };

    root.select(&SECTION_BLOCKS)
        .chain(root.select(&SPAN_BLOCKS))
        .map(|el| el.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the per-article text block.
pub fn format_article(sequence: usize, meta: &ArticleMeta, body: &str) -> String {
    format!(
        "第 {sequence} 篇文章====>\r\n标题： {}\r\n描述： {}\r\n正文内容 ---------------\r\n{body}\r\n ------------- \r\n",
        meta.title, meta.description
    )
}
