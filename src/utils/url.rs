// src/utils/url.rs

//! URL manipulation utilities.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static LEADING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+").expect("valid regex"));

/// Turn a protocol-relative reference (`//host/path`) into an https URL.
///
/// # Examples
/// ```
/// use graph_crawler::utils::url::absolutize;
///
/// assert_eq!(absolutize("//res.example.com/a.css"), "https://res.example.com/a.css");
/// assert_eq!(absolutize("http://x/y"), "http://x/y");
/// ```
pub fn absolutize(href: &str) -> String {
    let href = href.trim();
    match href.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => href.to_string(),
    }
}

/// Whether a reference points at an http(s) resource.
pub fn is_remote(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decode the HTML entities the platform leaves inside embedded URLs.
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Extract the host of a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Whether `url` is an http(s) URL hosted on `domain` or one of its subdomains.
pub fn is_platform_url(url: &str, domain: &str) -> bool {
    if !is_remote(url) {
        return false;
    }
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    match get_domain(url) {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        }
        None => false,
    }
}

/// Keep the candidates that are platform article URLs, trimmed.
///
/// Blank candidates are dropped silently; other rejects are logged.
pub fn filter_platform_urls<I, S>(candidates: I, domain: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref().trim();
            if candidate.is_empty() {
                return None;
            }
            if is_platform_url(candidate, domain) {
                Some(candidate.to_string())
            } else {
                log::warn!("Skipping non-article URL {candidate}");
                None
            }
        })
        .collect()
}

/// Stable local file name for a shared stylesheet or script.
///
/// Versioned names collapse onto their leading token, so
/// `appmsg.mg0vycs343acb927.js` becomes `appmsg.js`.
pub fn shared_asset_name(resource_url: &str) -> Option<String> {
    let parsed = Url::parse(resource_url).ok()?;
    let base = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())?;

    let extension = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    match LEADING_TOKEN.find(base) {
        Some(token) if token.as_str() != base => Some(format!("{}{}", token.as_str(), extension)),
        _ => Some(base.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_platform_urls() {
        let kept = filter_platform_urls(
            [
                " https://mp.weixin.qq.com/s/abc ",
                "",
                "https://evil.example.com/s/abc",
                "mp.weixin.qq.com/s/no-scheme",
                "https://sub.mp.weixin.qq.com/s/x",
            ],
            "mp.weixin.qq.com",
        );
        assert_eq!(
            kept,
            vec![
                "https://mp.weixin.qq.com/s/abc".to_string(),
                "https://sub.mp.weixin.qq.com/s/x".to_string()
            ]
        );
    }

    #[test]
    fn test_shared_asset_name_strips_version() {
        assert_eq!(
            shared_asset_name("https://res.example.com/js/appmsg.mg0vycs343acb927.js"),
            Some("appmsg.js".to_string())
        );
        assert_eq!(
            shared_asset_name("https://res.example.com/css/page_base.4a2b.css?v=3"),
            Some("page_base.css".to_string())
        );
    }

    #[test]
    fn test_shared_asset_name_plain_and_empty() {
        assert_eq!(
            shared_asset_name("https://res.example.com/lib/vendor.js"),
            Some("vendor.js".to_string())
        );
        assert_eq!(shared_asset_name("https://res.example.com/"), None);
        assert_eq!(shared_asset_name("not a url"), None);
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(
            unescape_html("http://x/s?__biz=a&amp;mid=1&amp;idx=2"),
            "http://x/s?__biz=a&mid=1&idx=2"
        );
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_is_platform_url() {
        assert!(is_platform_url("https://mp.weixin.qq.com/s/abc", "mp.weixin.qq.com"));
        assert!(is_platform_url("http://mp.weixin.qq.com/s?a=1", "mp.weixin.qq.com"));
        assert!(!is_platform_url("https://example.com/mp.weixin.qq.com", "mp.weixin.qq.com"));
        assert!(!is_platform_url("ftp://mp.weixin.qq.com/s", "mp.weixin.qq.com"));
    }

    #[test]
    fn test_get_domain() {
        assert_eq!(
            get_domain("https://sub.example.com:8080/path"),
            Some("sub.example.com".to_string())
        );
        assert_eq!(get_domain("nope"), None);
    }
}
