// src/services/normalizer/mod.rs

//! Turns object literals embedded in page scripts into strict JSON.
//!
//! Strategies run in order and the first one producing valid JSON wins:
//!
//! 1. input that already is JSON is returned unchanged
//! 2. the expression-aware parser ([`parser`])
//! 3. bounded regex rewrite passes ([`rewrite`])
//! 4. the character-level recovery walk ([`lenient`])
//!
//! Before 2-4 run, URLs wrapped in doubled quotes (`""https://x""`) are repaired.

pub mod lenient;
pub mod parser;
pub mod rewrite;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};

static URL_LEADING_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"""(https?://[^"\s]*)""#).expect("valid regex"));
static URL_TRAILING_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(https?://[^"\s]*)"""#).expect("valid regex"));
static URL_SPLIT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"""(https?)"://([^"\s]*)""#).expect("valid regex"));

/// Normalize a literal into strict JSON text.
pub fn normalize(literal: &str) -> Result<String> {
    let trimmed = literal.trim().trim_end_matches(';').trim_end();
    if trimmed.is_empty() {
        return Err(AppError::decode("empty literal"));
    }
    if is_json(trimmed) {
        return Ok(trimmed.to_string());
    }

    let cleaned = repair_url_quotes(trimmed);

    match parser::parse_literal(&cleaned) {
        Ok(value) => return Ok(value.to_string()),
        Err(e) => log::debug!("Expression parser gave up: {e}"),
    }

    let rewritten = rewrite::rewrite(&cleaned);
    if is_json(&rewritten) {
        log::debug!("Literal recovered by rewrite passes");
        return Ok(rewritten);
    }

    let recovered = lenient::recover(&cleaned);
    if is_json(&recovered) {
        log::debug!("Literal recovered by lenient walk");
        return Ok(recovered);
    }

    Err(AppError::decode(format!(
        "could not normalize literal starting with {:?}",
        trimmed.chars().take(80).collect::<String>()
    )))
}

/// Normalize a literal and parse the result.
pub fn normalize_value(literal: &str) -> Result<Value> {
    let json = normalize(literal)?;
    Ok(serde_json::from_str(&json)?)
}

/// Locate the object or array literal assigned to `target` in a script.
///
/// Returns the literal text from its opening bracket to the matching close,
/// skipping brackets inside string literals.
pub fn locate_assignment<'a>(html: &'a str, target: &str) -> Option<&'a str> {
    let assignment = Regex::new(&format!(r"{}\s*=\s*", regex::escape(target))).ok()?;
    let start = assignment.find(html)?.end();
    let body = &html[start..];

    let open = body.chars().next()?;
    if open != '{' && open != '[' {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&body[..offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}

fn repair_url_quotes(text: &str) -> String {
    let text = URL_SPLIT_SCHEME.replace_all(text, r#""$1://$2""#);
    let text = URL_LEADING_QUOTES.replace_all(&text, r#""$1""#);
    URL_TRAILING_QUOTES
        .replace_all(&text, r#""$1""#)
        .into_owned()
}
