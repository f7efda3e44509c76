// src/services/rewriter.rs

//! Offline snapshot rewriting.
//!
//! Works on raw tag text so the rest of the document is written back byte for
//! byte. [`collect_references`] lists what a page pulls from the network and
//! [`apply`] swaps those references for local relative paths once downloaded.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};

use crate::utils::{absolutize, is_remote, unescape_html};

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid regex"));
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>").expect("valid regex"));
static TITLE_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title>").expect("valid regex"));
static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").expect("valid regex"));

static DATA_SRC: LazyLock<Regex> = LazyLock::new(|| attr_pattern("data-src"));
static SRC: LazyLock<Regex> = LazyLock::new(|| attr_pattern("src"));
static HREF: LazyLock<Regex> = LazyLock::new(|| attr_pattern("href"));
static REL: LazyLock<Regex> = LazyLock::new(|| attr_pattern("rel"));

fn attr_pattern(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
        regex::escape(name)
    ))
    .expect("valid regex")
}

/// Kind of shared resource, which decides its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Stylesheet,
    Script,
}

impl AssetKind {
    /// Directory (relative to the output root) holding this kind.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Stylesheet => "css",
            Self::Script => "js",
        }
    }
}

/// Remote image referenced through `data-src`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Zero-based position among all `<img>` tags of the page
    pub ordinal: usize,
    pub url: String,
}

/// Stylesheet or script referenced by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    /// Attribute value exactly as written in the tag
    pub raw: String,
    /// Absolute URL to fetch
    pub url: String,
}

#[derive(Debug, Default)]
pub struct PageReferences {
    pub images: Vec<ImageRef>,
    pub assets: Vec<AssetRef>,
}

/// Local replacements keyed the way [`apply`] looks them up.
#[derive(Debug, Default)]
pub struct Rewrites {
    /// Image ordinal to relative path
    pub images: HashMap<usize, String>,
    /// Raw attribute value to relative path
    pub assets: HashMap<String, String>,
}

/// List remote images, stylesheets and scripts referenced by a page.
pub fn collect_references(html: &str) -> PageReferences {
    let mut refs = PageReferences::default();

    for (ordinal, tag) in IMG_TAG.find_iter(html).enumerate() {
        match attr_value(tag.as_str(), &DATA_SRC).map(|raw| resolve(&raw)) {
            Some(url) if is_remote(&url) => refs.images.push(ImageRef { ordinal, url }),
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    let mut push_asset = |kind: AssetKind, raw: String| {
        let url = resolve(&raw);
        if is_remote(&url) && seen.insert(raw.clone()) {
            refs.assets.push(AssetRef { kind, raw, url });
        }
    };

    for tag in LINK_TAG.find_iter(html) {
        if !is_stylesheet(tag.as_str()) {
            continue;
        }
        if let Some(raw) = attr_value(tag.as_str(), &HREF) {
            push_asset(AssetKind::Stylesheet, raw);
        }
    }
    for tag in SCRIPT_TAG.find_iter(html) {
        if let Some(raw) = attr_value(tag.as_str(), &SRC) {
            push_asset(AssetKind::Script, raw);
        }
    }

    refs
}

/// Point downloaded references at their local copies and retitle the page.
pub fn apply(html: &str, rewrites: &Rewrites, title: &str) -> String {
    let mut ordinal = 0usize;
    let page = IMG_TAG.replace_all(html, |caps: &Captures| {
        let tag = &caps[0];
        let current = ordinal;
        ordinal += 1;
        match rewrites.images.get(&current) {
            Some(local) => {
                let tag = set_attr(tag, &DATA_SRC, "data-src", local);
                set_attr(&tag, &SRC, "src", local)
            }
            None => tag.to_string(),
        }
    });

    let page = LINK_TAG.replace_all(&page, |caps: &Captures| {
        let tag = &caps[0];
        match attr_value(tag, &HREF).and_then(|raw| rewrites.assets.get(&raw)) {
            Some(local) if is_stylesheet(tag) => set_attr(tag, &HREF, "href", local),
            _ => tag.to_string(),
        }
    });

    let page = SCRIPT_TAG.replace_all(&page, |caps: &Captures| {
        let tag = &caps[0];
        match attr_value(tag, &SRC).and_then(|raw| rewrites.assets.get(&raw)) {
            Some(local) => set_attr(tag, &SRC, "src", local),
            None => tag.to_string(),
        }
    });

    set_title(&page, title)
}

fn set_title(page: &str, title: &str) -> String {
    let element = format!("<title>{}</title>", escape_text(title));
    if TITLE_ELEMENT.is_match(page) {
        return TITLE_ELEMENT
            .replace(page, NoExpand(&element))
            .into_owned();
    }
    match HEAD_OPEN.find(page) {
        Some(head) => format!("{}{}{}", &page[..head.end()], element, &page[head.end()..]),
        None => page.to_string(),
    }
}

fn resolve(raw: &str) -> String {
    absolutize(&unescape_html(raw))
}

fn is_stylesheet(tag: &str) -> bool {
    attr_value(tag, &REL).is_some_and(|rel| {
        rel.split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

fn attr_value(tag: &str, pattern: &Regex) -> Option<String> {
    let caps = pattern.captures(tag)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

fn set_attr(tag: &str, pattern: &Regex, name: &str, value: &str) -> String {
    let attribute = format!(" {name}=\"{}\"", escape_attr(value));
    if pattern.is_match(tag) {
        return pattern.replace(tag, NoExpand(&attribute)).into_owned();
    }
    let close = if tag.ends_with("/>") {
        tag.len() - 2
    } else {
        tag.len() - 1
    };
    format!("{}{}{}", tag[..close].trim_end(), attribute, &tag[close..])
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = concat!(
        "<html><head><title>Old</title>",
        r#"<link rel="stylesheet" href="//res.example.com/css/page.a1b2.css">"#,
        r#"<link rel="icon" href="https://res.example.com/favicon.ico">"#,
        r#"<script src="https://res.example.com/js/appmsg.mg0vycs.js"></script>"#,
        "<script>var inline = 1;</script></head><body>",
        r#"<img src="data:image/gif;base64,AA" data-src="https://img.example.com/1?a=1&amp;b=2">"#,
        r#"<img class="logo" src="/local.png">"#,
        r#"<IMG data-src='https://img.example.com/3'/>"#,
        "</body></html>"
    );

    #[test]
    fn test_collect_references() {
        let refs = collect_references(PAGE);

        assert_eq!(
            refs.images,
            vec![
                ImageRef {
                    ordinal: 0,
                    url: "https://img.example.com/1?a=1&b=2".into()
                },
                ImageRef {
                    ordinal: 2,
                    url: "https://img.example.com/3".into()
                },
            ]
        );
        assert_eq!(refs.assets.len(), 2);
        assert_eq!(refs.assets[0].kind, AssetKind::Stylesheet);
        assert_eq!(refs.assets[0].url, "https://res.example.com/css/page.a1b2.css");
        assert_eq!(refs.assets[1].kind, AssetKind::Script);
    }

    #[test]
    fn test_apply_rewrites_only_downloaded_refs() {
        let mut rewrites = Rewrites::default();
        rewrites.images.insert(0, "trip/0.jpeg".into());
        rewrites.assets.insert(
            "//res.example.com/css/page.a1b2.css".into(),
            "css/page.css".into(),
        );
        rewrites.assets.insert(
            "https://res.example.com/js/appmsg.mg0vycs.js".into(),
            "js/appmsg.js".into(),
        );

        let page = apply(PAGE, &rewrites, "trip");

        assert!(page.contains("<title>trip</title>"));
        assert!(page.contains(r#"<img src="trip/0.jpeg" data-src="trip/0.jpeg">"#));
        assert!(page.contains(r#"<IMG data-src='https://img.example.com/3'/>"#));
        assert!(page.contains(r#"<link rel="stylesheet" href="css/page.css">"#));
        assert!(page.contains(r#"href="https://res.example.com/favicon.ico""#));
        assert!(page.contains(r#"<script src="js/appmsg.js"></script>"#));
        assert!(page.contains("<script>var inline = 1;</script>"));
    }

    #[test]
    fn test_set_attr_inserts_missing_attribute() {
        assert_eq!(
            set_attr("<img data-src='x'/>", &SRC, "src", "a/0.jpeg"),
            r#"<img data-src='x' src="a/0.jpeg"/>"#
        );
    }

    #[test]
    fn test_title_inserted_when_missing() {
        assert_eq!(
            set_title("<html><head></head></html>", "t"),
            "<html><head><title>t</title></head></html>"
        );
    }
}
