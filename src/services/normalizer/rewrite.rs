// src/services/normalizer/rewrite.rs

//! Pattern-based rewrite passes, applied until the text stops changing.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on rewrite rounds.
pub const MAX_PASSES: usize = 10;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("valid regex"),
        replacement,
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // 'text' -> "text"
        rule(r#"'([^'"\\]*)'"#, r#""$1""#),
        // "12" * 1 -> 12
        rule(r#""(-?\d+(?:\.\d+)?)"\s*\*\s*1\b"#, "$1"),
        // "" * 1 -> 0
        rule(r#"""\s*\*\s*1\b"#, "0"),
        // "" || "x" -> "x"
        rule(r#"""\s*\|\|\s*("[^"]*"|-?\d+)"#, "$1"),
        // "a" || "x" -> "a"
        rule(r#""([^"]+)"\s*\|\|\s*(?:"[^"]*"|-?\d+)"#, r#""$1""#),
        // "" ? a : b -> b
        rule(
            r#"""\s*\?\s*(?:"[^"]*"|-?\d+)\s*:\s*("[^"]*"|-?\d+)"#,
            "$1",
        ),
        // "x" ? a : b -> a
        rule(
            r#""[^"]+"\s*\?\s*("[^"]*"|-?\d+)\s*:\s*(?:"[^"]*"|-?\d+)"#,
            "$1",
        ),
        rule(r",\s*([}\]])", "$1"),
        rule(r",\s*,", ","),
        // { key: -> { "key":
        rule(r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#, r#"$1"$2":"#),
    ]
});

/// Apply every rule in order, repeating until a round changes nothing.
pub fn rewrite(literal: &str) -> String {
    let mut text = literal.to_string();
    for _ in 0..MAX_PASSES {
        let before = text.clone();
        for rule in RULES.iter() {
            text = rule
                .pattern
                .replace_all(&text, rule.replacement)
                .into_owned();
        }
        if text == before {
            break;
        }
    }
    text
}
