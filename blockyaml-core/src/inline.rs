//! Single-line values: plain and quoted scalars plus flow collections.

use indexmap::IndexMap;

use crate::value::YamlValue;

/// Pattern fragment matching one single- or double-quoted scalar. Line
/// classification embeds it so separators inside quotes are skipped.
pub const QUOTED_STRING: &str = r#"(?:"(?:[^"\\]*(?:\\.[^"\\]*)*)"|'(?:[^']*(?:''[^']*)*)')"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InlineError {
    #[error("unterminated quoted scalar {0}")]
    UnterminatedQuote(String),
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(String),
    #[error("unexpected characters near \"{0}\"")]
    TrailingCharacters(String),
    #[error("unterminated flow collection {0}")]
    UnterminatedFlow(String),
    #[error("expected ':' after flow mapping key \"{0}\"")]
    MissingColon(String),
}

/// The collaborator the block parser hands single-line content to.
pub trait InlineParser {
    /// Parses a mapping key into its textual form.
    fn parse_scalar(&self, text: &str) -> Result<String, InlineError>;

    /// Parses a full inline value: a typed scalar or a flow collection.
    fn load(&self, text: &str) -> Result<YamlValue, InlineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FlowParser;

impl InlineParser for FlowParser {
    fn parse_scalar(&self, text: &str) -> Result<String, InlineError> {
        let text = text.trim();
        if is_quote(text.chars().next()) {
            let (value, consumed) = read_quoted(text)?;
            let rest = text[consumed..].trim();
            if !rest.is_empty() {
                return Err(InlineError::TrailingCharacters(rest.to_string()));
            }
            return Ok(value);
        }
        Ok(text.to_string())
    }

    fn load(&self, text: &str) -> Result<YamlValue, InlineError> {
        let text = text.trim();
        match text.chars().next() {
            None => Ok(YamlValue::Str(String::new())),
            Some('[') | Some('{') => {
                let mut flow = Flow::new(text);
                let value = flow.collection()?;
                flow.finish()?;
                Ok(value)
            }
            Some('"') | Some('\'') => {
                let (value, consumed) = read_quoted(text)?;
                let rest = text[consumed..].trim_start();
                if !rest.is_empty() && !rest.starts_with('#') {
                    return Err(InlineError::TrailingCharacters(rest.to_string()));
                }
                Ok(YamlValue::Str(value))
            }
            Some(_) => Ok(evaluate_plain(strip_comment(text).trim())),
        }
    }
}

fn is_quote(c: Option<char>) -> bool {
    matches!(c, Some('"') | Some('\''))
}

/// Cuts a plain scalar at the first ` #`.
fn strip_comment(text: &str) -> &str {
    match text.find(" #") {
        Some(pos) => &text[..pos],
        None => text,
    }
}

struct Flow<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Flow<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn collection(&mut self) -> Result<YamlValue, InlineError> {
        match self.peek() {
            Some('[') => self.sequence(),
            _ => self.mapping(),
        }
    }

    fn sequence(&mut self) -> Result<YamlValue, InlineError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(InlineError::UnterminatedFlow(self.text.to_string())),
                Some(']') => {
                    self.pos += 1;
                    return Ok(YamlValue::Seq(items));
                }
                Some(',') => self.pos += 1,
                Some('[') | Some('{') => items.push(self.collection()?),
                Some(_) => items.push(self.scalar(&[',', ']'])?),
            }
        }
    }

    fn mapping(&mut self) -> Result<YamlValue, InlineError> {
        self.pos += 1;
        let mut map = IndexMap::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(InlineError::UnterminatedFlow(self.text.to_string())),
                Some('}') => {
                    self.pos += 1;
                    return Ok(YamlValue::Map(map));
                }
                Some(',') => self.pos += 1,
                Some(_) => {
                    let key = self.key()?;
                    self.skip_whitespace();
                    if self.peek() != Some(':') {
                        return Err(InlineError::MissingColon(key));
                    }
                    self.pos += 1;
                    self.skip_whitespace();
                    let value = match self.peek() {
                        None => {
                            return Err(InlineError::UnterminatedFlow(self.text.to_string()))
                        }
                        Some(',') | Some('}') => YamlValue::Null,
                        Some('[') | Some('{') => self.collection()?,
                        Some(_) => self.scalar(&[',', '}'])?,
                    };
                    map.shift_remove(&key);
                    map.insert(key, value);
                }
            }
        }
    }

    fn key(&mut self) -> Result<String, InlineError> {
        if is_quote(self.peek()) {
            let (key, consumed) = read_quoted(self.rest())?;
            self.pos += consumed;
            return Ok(key);
        }
        let rest = self.rest();
        let end = rest.find([':', ',', '}']).unwrap_or(rest.len());
        self.pos += end;
        Ok(rest[..end].trim().to_string())
    }

    fn scalar(&mut self, delimiters: &[char]) -> Result<YamlValue, InlineError> {
        if is_quote(self.peek()) {
            let (value, consumed) = read_quoted(self.rest())?;
            self.pos += consumed;
            return Ok(YamlValue::Str(value));
        }
        let rest = self.rest();
        let end = rest.find(delimiters).unwrap_or(rest.len());
        self.pos += end;
        Ok(evaluate_plain(rest[..end].trim()))
    }

    fn finish(&self) -> Result<(), InlineError> {
        let rest = self.rest().trim_start();
        if rest.is_empty() || rest.starts_with('#') {
            Ok(())
        } else {
            Err(InlineError::TrailingCharacters(rest.to_string()))
        }
    }
}

/// Reads the quoted scalar at the start of `text`, returning its unescaped
/// value and the number of bytes consumed including both quotes.
fn read_quoted(text: &str) -> Result<(String, usize), InlineError> {
    let mut chars = text.char_indices();
    let quote = match chars.next() {
        Some((_, c @ ('"' | '\''))) => c,
        _ => return Err(InlineError::UnterminatedQuote(text.to_string())),
    };
    let mut out = String::new();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\'' if quote == '\'' => {
                if text[idx + 1..].starts_with('\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    return Ok((out, idx + 1));
                }
            }
            '"' if quote == '"' => return Ok((out, idx + 1)),
            '\\' if quote == '"' => {
                let (_, code) = chars
                    .next()
                    .ok_or_else(|| InlineError::UnterminatedQuote(text.to_string()))?;
                out.push(unescape(code, &mut chars)?);
            }
            _ => out.push(ch),
        }
    }
    Err(InlineError::UnterminatedQuote(text.to_string()))
}

fn unescape(code: char, chars: &mut std::str::CharIndices<'_>) -> Result<char, InlineError> {
    let width = match code {
        '0' => return Ok('\0'),
        'a' => return Ok('\x07'),
        'b' => return Ok('\x08'),
        't' => return Ok('\t'),
        'n' => return Ok('\n'),
        'v' => return Ok('\x0b'),
        'f' => return Ok('\x0c'),
        'r' => return Ok('\r'),
        'e' => return Ok('\x1b'),
        ' ' => return Ok(' '),
        '"' => return Ok('"'),
        '/' => return Ok('/'),
        '\\' => return Ok('\\'),
        'N' => return Ok('\u{85}'),
        '_' => return Ok('\u{a0}'),
        'L' => return Ok('\u{2028}'),
        'P' => return Ok('\u{2029}'),
        'x' => 2,
        'u' => 4,
        'U' => 8,
        other => return Err(InlineError::InvalidEscape(other.to_string())),
    };
    let digits: String = chars.by_ref().take(width).map(|(_, c)| c).collect();
    u32::from_str_radix(&digits, 16)
        .ok()
        .filter(|_| digits.len() == width)
        .and_then(char::from_u32)
        .ok_or_else(|| InlineError::InvalidEscape(format!("{code}{digits}")))
}

/// Types an unquoted scalar.
fn evaluate_plain(text: &str) -> YamlValue {
    if text.is_empty() || text == "~" || text.eq_ignore_ascii_case("null") {
        return YamlValue::Null;
    }
    if ["true", "yes", "on"]
        .iter()
        .any(|word| text.eq_ignore_ascii_case(word))
    {
        return YamlValue::Bool(true);
    }
    if ["false", "no", "off"]
        .iter()
        .any(|word| text.eq_ignore_ascii_case(word))
    {
        return YamlValue::Bool(false);
    }
    if let Some(forced) = text
        .strip_prefix("!!str ")
        .or_else(|| text.strip_prefix("!str "))
    {
        return YamlValue::Str(forced.to_string());
    }
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return YamlValue::Float(f64::INFINITY)
        }
        "-.inf" | "-.Inf" | "-.INF" => return YamlValue::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return YamlValue::Float(f64::NAN),
        _ => {}
    }
    parse_number(text).unwrap_or_else(|| YamlValue::Str(text.to_string()))
}

fn parse_number(text: &str) -> Option<YamlValue> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let sign = if negative { -1 } else { 1 };

    if let Some(hex) = unsigned.strip_prefix("0x") {
        if hex.starts_with(['+', '-']) {
            return None;
        }
        return i64::from_str_radix(hex, 16)
            .ok()
            .map(|n| YamlValue::Int(sign * n));
    }
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        let is_octal = unsigned.len() > 1
            && unsigned.starts_with('0')
            && unsigned.bytes().all(|b| (b'0'..=b'7').contains(&b));
        let parsed = if is_octal {
            i64::from_str_radix(unsigned, 8)
        } else {
            unsigned.parse::<i64>()
        };
        return match parsed {
            Ok(n) => Some(YamlValue::Int(sign * n)),
            Err(_) => text.parse::<f64>().ok().map(YamlValue::Float),
        };
    }

    let starts_numeric = unsigned
        .trim_start_matches('.')
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit());
    let float_chars = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if starts_numeric && float_chars {
        return text.parse::<f64>().ok().map(YamlValue::Float);
    }
    None
}
