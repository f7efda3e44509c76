// src/services/listing.rs

//! Album listing resolver.
//!
//! Reads the first page of an album from the data object embedded in its landing
//! page, then follows the pagination endpoint until the platform reports no more
//! entries, a page brings nothing new, or the request budget runs out.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AlbumEntry, AlbumListing, AlbumPage, ArticleReference, LandingData, ListingConfig};
use crate::services::normalizer::{locate_assignment, normalize_value};
use crate::utils::http::fetch_text;
use crate::utils::unescape_html;

/// Script variable holding the landing page's album data.
pub const LANDING_MARKER: &str = "window.cgiData";

/// Query parameters identifying an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumParams {
    /// Account identifier (`__biz`)
    pub biz: String,
    pub album_id: String,
}

impl AlbumParams {
    /// Read `__biz` and `album_id` from a landing URL.
    pub fn from_url(url: &Url) -> Result<Self> {
        let find = |key: &str| {
            url.query_pairs()
                .find(|(k, v)| k == key && !v.trim().is_empty())
                .map(|(_, v)| v.into_owned())
        };

        match (find("__biz"), find("album_id")) {
            (Some(biz), Some(album_id)) => Ok(Self { biz, album_id }),
            _ => Err(AppError::parse(format!(
                "landing URL must carry __biz and album_id: {url}"
            ))),
        }
    }
}

/// Build the pagination request for the page following `cursor`.
pub fn album_api_url(
    landing: &Url,
    params: &AlbumParams,
    cursor: Option<&str>,
    page_size: usize,
) -> Url {
    let mut api = landing.clone();
    api.set_fragment(None);
    {
        let mut query = api.query_pairs_mut();
        query
            .clear()
            .append_pair("action", "getalbum")
            .append_pair("__biz", &params.biz)
            .append_pair("album_id", &params.album_id)
            .append_pair("count", &page_size.to_string())
            .append_pair("f", "json");
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            query
                .append_pair("begin_msgid", cursor)
                .append_pair("begin_itemidx", "1");
        }
    }
    api
}

/// Accumulates entries in discovery order, dropping URLs already seen.
#[derive(Debug, Default)]
struct Collector {
    seen: HashSet<String>,
    articles: Vec<ArticleReference>,
}

impl Collector {
    /// Add a batch and return how many entries were new.
    fn absorb(&mut self, entries: &[AlbumEntry]) -> usize {
        let before = self.articles.len();
        for entry in entries {
            let url = unescape_html(entry.url.trim());
            if url.is_empty() || !self.seen.insert(url.clone()) {
                continue;
            }
            self.articles.push(ArticleReference {
                index: self.articles.len() + 1,
                title: entry.title.trim().to_string(),
                url,
                message_id: entry.msgid.clone(),
                created_at: entry.create_time.clone(),
            });
        }
        self.articles.len() - before
    }
}

/// Resolves an album landing URL into its ordered article list.
pub struct ListingResolver {
    client: Client,
    settings: ListingConfig,
}

impl ListingResolver {
    pub fn new(client: Client, settings: ListingConfig) -> Self {
        Self { client, settings }
    }

    /// Resolve every article of the album at `landing_url`.
    pub async fn resolve(&self, landing_url: &str) -> Result<AlbumListing> {
        let landing = Url::parse(landing_url.trim())?;
        let params = AlbumParams::from_url(&landing)?;

        let html = fetch_text(&self.client, landing.as_str()).await?;
        let literal = locate_assignment(&html, LANDING_MARKER).ok_or_else(|| {
            AppError::parse(format!("no {LANDING_MARKER} object in {landing}"))
        })?;
        let data: LandingData = serde_json::from_value(normalize_value(literal)?)
            .map_err(|e| AppError::decode(format!("landing data has unexpected shape: {e}")))?;
        if data.ret != 0 {
            return Err(AppError::fetch(
                landing.as_str(),
                format!("album landing page returned ret={}", data.ret),
            ));
        }

        log::info!(
            "Album '{}' by {}: {} declared, {} on landing page",
            data.title,
            data.nick_name,
            data.article_count,
            data.article_list.len()
        );

        let mut collector = Collector::default();
        collector.absorb(&data.article_list);
        let mut cursor = data.article_list.last().map(|e| e.msgid.clone());
        let mut more = data.continue_flag != 0;
        let mut request_count = 0;
        let interval = Duration::from_millis(self.settings.request_interval_ms);

        while more && request_count < self.settings.max_requests {
            let api = album_api_url(
                &landing,
                &params,
                cursor.as_deref(),
                self.settings.page_size,
            );
            request_count += 1;
            log::debug!("Album page request #{request_count}: {api}");

            let body = fetch_text(&self.client, api.as_str()).await?;
            let page: AlbumPage = serde_json::from_str(&body)
                .map_err(|e| AppError::decode(format!("album page is not JSON: {e}")))?;

            if page.base_resp.ret != 0 {
                return Err(AppError::fetch(
                    api.as_str(),
                    format!("album endpoint returned ret={}", page.base_resp.ret),
                ));
            }

            let entries = &page.getalbum_resp.article_list;
            if entries.is_empty() {
                log::debug!("Album page #{request_count} is empty, stopping");
                break;
            }

            let added = collector.absorb(entries);
            if added == 0 {
                log::info!("Album page #{request_count} brought no new articles, stopping");
                break;
            }

            cursor = entries.last().map(|e| e.msgid.clone());
            more = page.getalbum_resp.continue_flag != 0;

            if more && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }

        let budget_exhausted = more && request_count >= self.settings.max_requests;
        if budget_exhausted {
            log::warn!(
                "Request budget of {} exhausted; album listing may be incomplete",
                self.settings.max_requests
            );
        }

        Ok(AlbumListing {
            title: data.title,
            description: data.desc,
            nickname: data.nick_name,
            declared_count: u64::try_from(data.article_count).unwrap_or(0),
            articles: collector.articles,
            request_count,
            budget_exhausted,
        })
    }
}
