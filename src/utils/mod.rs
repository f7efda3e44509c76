//! Utility functions and helpers.

pub mod fs;
pub mod http;
pub mod log;
pub mod slug;
pub mod url;

pub use slug::slugify;
pub use url::{absolutize, filter_platform_urls, get_domain, is_platform_url, is_remote, unescape_html};
