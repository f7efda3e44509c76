// src/models/album.rs

//! Album listing models.
//!
//! The platform embeds the first page of an album in the landing page and serves
//! the rest through a JSON pagination endpoint. Field types drift between the two
//! (identifiers and flags show up as numbers or strings, a one-entry list as a bare
//! object), so the payload shapes below decode leniently.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One article of an album, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleReference {
    /// 1-based position in discovery order
    pub index: usize,
    pub title: String,
    /// Canonical URL with HTML entities decoded
    pub url: String,
    pub message_id: String,
    pub created_at: String,
}

/// Fully resolved album.
#[derive(Debug, Clone, Default)]
pub struct AlbumListing {
    pub title: String,
    pub description: String,
    /// Account nickname of the album owner
    pub nickname: String,
    /// Article count announced by the landing page
    pub declared_count: u64,
    pub articles: Vec<ArticleReference>,
    /// Pagination requests issued, landing page excluded
    pub request_count: usize,
    /// Set when the loop stopped because the request budget ran out
    pub budget_exhausted: bool,
}

impl AlbumListing {
    /// Article URLs in discovery order.
    pub fn urls(&self) -> Vec<String> {
        self.articles.iter().map(|a| a.url.clone()).collect()
    }
}

/// Entry as it appears in both the landing data and the pagination payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumEntry {
    #[serde(default, deserialize_with = "flex_string")]
    pub title: String,

    #[serde(default, deserialize_with = "flex_string")]
    pub url: String,

    #[serde(default, deserialize_with = "flex_string")]
    pub msgid: String,

    #[serde(default, deserialize_with = "flex_string")]
    pub create_time: String,
}

/// Data object assigned to the landing page marker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandingData {
    #[serde(default, deserialize_with = "flex_i64")]
    pub ret: i64,

    #[serde(rename = "articleList", default, deserialize_with = "one_or_many")]
    pub article_list: Vec<AlbumEntry>,

    #[serde(default, deserialize_with = "flex_i64")]
    pub continue_flag: i64,

    #[serde(default, deserialize_with = "flex_string")]
    pub title: String,

    #[serde(default, deserialize_with = "flex_string")]
    pub desc: String,

    #[serde(default, deserialize_with = "flex_string")]
    pub nick_name: String,

    #[serde(default, deserialize_with = "flex_i64")]
    pub article_count: i64,
}

/// Pagination endpoint payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumPage {
    #[serde(default)]
    pub base_resp: BaseResponse,

    #[serde(default)]
    pub getalbum_resp: AlbumPageBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseResponse {
    #[serde(default, deserialize_with = "flex_i64")]
    pub ret: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumPageBody {
    #[serde(default, deserialize_with = "one_or_many")]
    pub article_list: Vec<AlbumEntry>,

    #[serde(default, deserialize_with = "flex_i64")]
    pub continue_flag: i64,
}

fn flex_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn flex_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<AlbumEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        single @ Value::Object(_) => serde_json::from_value(single)
            .map(|entry| vec![entry])
            .map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}
