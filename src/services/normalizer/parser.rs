// src/services/normalizer/parser.rs

//! Expression-aware reader for script object literals.
//!
//! Accepts the subset of script syntax that shows up in embedded page data:
//! bare or single-quoted keys, trailing and repeated commas, comments, and value
//! positions holding `||`/`&&` fallbacks, `cond ? a : b` conditionals, unary
//! signs and `*`/`/`/`+`/`-` coercions. Expressions are evaluated on the spot so
//! the result is plain JSON data.

use std::fmt;

use serde_json::{Map, Number, Value};

/// Nesting limit for objects, arrays and parentheses.
const MAX_DEPTH: usize = 128;

/// Where and why reading stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at char {}", self.message, self.position)
    }
}

type ParseResult<T> = std::result::Result<T, SyntaxError>;

/// Read a complete literal (optionally followed by `;`) into a JSON value.
pub fn parse_literal(input: &str) -> ParseResult<Value> {
    let mut parser = Parser::new(input);
    let value = parser.expression()?;
    parser.skip_trivia();
    while parser.eat(';') {
        parser.skip_trivia();
    }
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        self.skip_trivia();
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while !self.at_end() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> ParseResult<Value> {
        let test = self.logical_or()?;
        self.skip_trivia();
        if !self.eat('?') {
            return Ok(test);
        }
        self.enter()?;
        let consequent = self.expression()?;
        self.expect(':')?;
        let alternate = self.expression()?;
        self.leave();
        Ok(if truthy(&test) { consequent } else { alternate })
    }

    fn logical_or(&mut self) -> ParseResult<Value> {
        let mut left = self.logical_and()?;
        loop {
            self.skip_trivia();
            if self.peek() == Some('|') && self.peek_at(1) == Some('|') {
                self.pos += 2;
                let right = self.logical_and()?;
                if !truthy(&left) {
                    left = right;
                }
            } else {
                return Ok(left);
            }
        }
    }

    fn logical_and(&mut self) -> ParseResult<Value> {
        let mut left = self.additive()?;
        loop {
            self.skip_trivia();
            if self.peek() == Some('&') && self.peek_at(1) == Some('&') {
                self.pos += 2;
                let right = self.additive()?;
                if truthy(&left) {
                    left = right;
                }
            } else {
                return Ok(left);
            }
        }
    }

    fn additive(&mut self) -> ParseResult<Value> {
        let mut left = self.multiplicative()?;
        loop {
            self.skip_trivia();
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    let right = self.multiplicative()?;
                    left = match (&left, &right) {
                        (Value::String(a), b) => Value::String(format!("{a}{}", display(b))),
                        (a, Value::String(b)) => Value::String(format!("{}{b}", display(a))),
                        (a, b) => number_value(to_number(a) + to_number(b)),
                    };
                }
                Some('-') => {
                    self.pos += 1;
                    let right = self.multiplicative()?;
                    left = number_value(to_number(&left) - to_number(&right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn multiplicative(&mut self) -> ParseResult<Value> {
        let mut left = self.unary()?;
        loop {
            self.skip_trivia();
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = number_value(to_number(&left) * to_number(&right));
                }
                Some('/') => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = number_value(to_number(&left) / to_number(&right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> ParseResult<Value> {
        self.skip_trivia();
        let op = match self.peek() {
            Some(op @ ('-' | '+' | '!')) => op,
            _ => return self.primary(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary()?;
        self.leave();
        Ok(match op {
            '-' => number_value(-to_number(&operand)),
            '+' => number_value(to_number(&operand)),
            _ => Value::Bool(!truthy(&operand)),
        })
    }

    fn primary(&mut self) -> ParseResult<Value> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some(q @ ('"' | '\'')) => self.string(q).map(Value::String),
            Some('(') => {
                self.pos += 1;
                self.enter()?;
                let inner = self.expression()?;
                self.expect(')')?;
                self.leave();
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let word = self.identifier();
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" | "NaN" | "Infinity" => Ok(Value::Null),
                    _ => Err(SyntaxError {
                        position: start,
                        message: format!("unsupported identifier '{word}'"),
                    }),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> ParseResult<Value> {
        self.pos += 1;
        self.enter()?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            while self.eat(',') {
                self.skip_trivia();
            }
            if self.eat('}') {
                break;
            }
            let key = self.property_key()?;
            self.expect(':')?;
            let value = self.expression()?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return Err(self.error("expected ',' or '}'"));
        }
        self.leave();
        Ok(Value::Object(map))
    }

    fn property_key(&mut self) -> ParseResult<String> {
        self.skip_trivia();
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.string(q),
            Some(c) if is_ident_start(c) => Ok(self.identifier()),
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '.') {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(self.error("expected property name")),
        }
    }

    fn array(&mut self) -> ParseResult<Value> {
        self.pos += 1;
        self.enter()?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(']') {
                break;
            }
            if self.eat(',') {
                continue;
            }
            items.push(self.expression()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                break;
            }
            return Err(self.error("expected ',' or ']'"));
        }
        self.leave();
        Ok(Value::Array(items))
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn string(&mut self, quote: char) -> ParseResult<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated string"))?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self
                .bump()
                .ok_or_else(|| self.error("unterminated escape"))?;
            match escaped {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                '0' => out.push('\0'),
                'x' => {
                    let code = self.hex_digits(2)?;
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                'u' => out.push(self.unicode_escape()?),
                '\r' => {
                    self.eat('\n');
                }
                '\n' => {}
                other => out.push(other),
            }
        }
    }

    fn hex_digits(&mut self, count: usize) -> ParseResult<u32> {
        let mut code = 0;
        for _ in 0..count {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn unicode_escape(&mut self) -> ParseResult<char> {
        if self.eat('{') {
            let mut code = 0u32;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                self.pos += 1;
                code = code.saturating_mul(16).saturating_add(digit);
            }
            if !self.eat('}') {
                return Err(self.error("invalid unicode escape"));
            }
            return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            let checkpoint = self.pos;
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = checkpoint;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn number(&mut self) -> ParseResult<Value> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[digits_start..self.pos].iter().collect();
            return i64::from_str_radix(&digits, 16)
                .map(Value::from)
                .map_err(|_| self.error("invalid hex literal"));
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::from(int));
        }
        if let Ok(int) = text.parse::<u64>() {
            return Ok(Value::from(int));
        }
        text.parse::<f64>()
            .map(number_value)
            .map_err(|_| SyntaxError {
                position: start,
                message: format!("invalid number '{text}'"),
            })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Script truthiness: empty strings, zero, NaN, null and false are absent.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric coercion as applied by arithmetic operators.
fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Integral results stay integers; non-finite results become null.
fn number_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercions_and_fallbacks() {
        let value = parse_literal(
            r#"{
                is_pay_subscribe: "0" * 1,
                nick_name: "一安未来" || "",
                total_onread: "" ? "" * 1 : -1,
                count: '12' * 1,
            }"#,
        )
        .unwrap();

        assert_eq!(
            value,
            json!({
                "is_pay_subscribe": 0,
                "nick_name": "一安未来",
                "total_onread": -1,
                "count": 12
            })
        );
    }

    #[test]
    fn test_or_picks_first_present() {
        assert_eq!(parse_literal(r#""" || "b""#).unwrap(), json!("b"));
        assert_eq!(parse_literal(r#"0 || 7"#).unwrap(), json!(7));
        assert_eq!(parse_literal(r#""a" || "b""#).unwrap(), json!("a"));
    }

    #[test]
    fn test_comments_commas_and_nesting() {
        let value = parse_literal(
            "{\n  // leading comment\n  list: [1,, 2, /* inline */ 3,],\n  nested: {'k': \"v\",,},\n};",
        )
        .unwrap();
        assert_eq!(value, json!({"list": [1, 2, 3], "nested": {"k": "v"}}));
    }

    #[test]
    fn test_string_escapes() {
        let value = parse_literal(r#"['it\'s', "中\x41", "a\/b"]"#).unwrap();
        assert_eq!(value, json!(["it's", "中A", "a/b"]));
    }

    #[test]
    fn test_rejects_unknown_identifiers() {
        let err = parse_literal("{ a: window.location }").unwrap_err();
        assert!(err.message.contains("window"));
    }

    #[test]
    fn test_prefix_and_ternary_chains_are_depth_bounded() {
        assert_eq!(parse_literal("--5").unwrap(), json!(5));
        assert_eq!(parse_literal("!!'x'").unwrap(), json!(true));

        let prefixes = format!("{{a: {}1}}", "-".repeat(20_000));
        assert!(parse_literal(&prefixes).unwrap_err().message.contains("too deep"));

        let ternaries = format!("{}1{}", "1 ? ".repeat(20_000), " : 0".repeat(20_000));
        assert!(parse_literal(&ternaries).unwrap_err().message.contains("too deep"));
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert!(parse_literal("{a: 1} b").is_err());
        assert!(parse_literal("{a: 1").is_err());
    }
}
