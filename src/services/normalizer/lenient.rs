// src/services/normalizer/lenient.rs

//! Character-level recovery for literals the other passes cannot handle.
//!
//! Walks the text once, tracking string and nesting state. Keys are quoted,
//! strings are re-quoted with double quotes, expression tails after `|`, `&`,
//! `*`, `+` or `?` are dropped (the left operand is kept), and identifiers in
//! value position other than `true`/`false`/`null` become `null`.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static REPEATED_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*,)+").expect("valid regex"));
static LEADING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\[{]\s*),").expect("valid regex"));

/// Best-effort conversion of a literal to JSON text. The result may still be invalid.
pub fn recover(literal: &str) -> String {
    let chars: Vec<char> = literal.chars().collect();
    let mut out = String::with_capacity(literal.len() + 16);
    let mut nesting: Vec<char> = Vec::new();
    let mut after_colon = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            '/' if matches!(chars.get(i + 1), Some('/') | Some('*')) => {
                i = skip_comment(&chars, i);
                continue;
            }
            '{' | '[' => {
                nesting.push(c);
                after_colon = false;
                out.push(c);
            }
            '}' | ']' => {
                nesting.pop();
                after_colon = false;
                out.push(c);
            }
            ':' => {
                after_colon = true;
                out.push(c);
            }
            ',' => {
                after_colon = false;
                out.push(c);
            }
            '|' | '&' | '*' | '+' | '?' => {
                i = skip_to_delimiter(&chars, i);
                continue;
            }
            '-' | '.' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric()
                        || chars[i] == '.'
                        || (matches!(chars[i], '+' | '-')
                            && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                if token.parse::<f64>().is_ok() {
                    out.push_str(&token);
                } else {
                    out.push_str("null");
                }
                continue;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '$' | '.'))
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let key_position = nesting.last() == Some(&'{') && !after_colon;
                if key_position {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else if matches!(word.as_str(), "true" | "false" | "null") {
                    out.push_str(&word);
                } else {
                    out.push_str("null");
                    i = skip_call_arguments(&chars, i);
                }
                continue;
            }
            ';' if nesting.is_empty() => {}
            _ => out.push(c),
        }
        i += 1;
    }

    let out = REPEATED_COMMA.replace_all(&out, ",");
    let out = LEADING_COMMA.replace_all(&out, "$1");
    TRAILING_COMMA.replace_all(&out, "$1").into_owned()
}

/// Copy a string literal starting at `start` as a double-quoted JSON string.
/// Returns the index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            out.push('"');
            return i + 1;
        }
        match c {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    break;
                };
                match next {
                    '\'' => out.push('\''),
                    'x' => {
                        let hex: String = chars.iter().skip(i + 2).take(2).collect();
                        match u32::from_str_radix(&hex, 16) {
                            Ok(code) if hex.len() == 2 => {
                                out.push_str(&format!("\\u{code:04x}"));
                                i += 2;
                            }
                            _ => out.push('x'),
                        }
                    }
                    '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u' => {
                        out.push('\\');
                        out.push(next);
                    }
                    other => out.push(other),
                }
                i += 2;
                continue;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
        i += 1;
    }

    // Unterminated: close it so the structure can still be checked.
    out.push('"');
    chars.len()
}

fn skip_comment(chars: &[char], start: usize) -> usize {
    let block = chars.get(start + 1) == Some(&'*');
    let mut i = start + 2;
    while i < chars.len() {
        if block {
            if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                return i + 2;
            }
        } else if chars[i] == '\n' {
            return i;
        }
        i += 1;
    }
    chars.len()
}

/// Skip an expression tail up to the next `,`, `}` or `]` at the current level.
fn skip_to_delimiter(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                i = skip_string(chars, i);
                continue;
            }
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' if depth > 0 => depth -= 1,
            ',' | '}' | ']' if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

fn skip_call_arguments(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    if chars.get(i) == Some(&'(') {
        skip_to_delimiter(chars, i)
    } else {
        start
    }
}

fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}
