//! Line-level lexing: comment stripping, tokenizing, and heredoc capture

use crate::common::{Error, Result};

/// Token that opens a heredoc
const HEREDOC_OPEN: &str = "<<";

/// Trim a raw script line and strip comments
///
/// Returns an empty string for blank and comment-only lines. A trailing
/// comment starts at the first ` #` or ` //`.
///
/// Comment stripping does not look at quotes: `assert_equals "a #b"` is cut
/// at ` #`. Use a heredoc for text that contains comment markers.
pub fn preprocess_line(line: &str) -> &str {
    let mut line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return "";
    }

    if let Some(idx) = line.find(" #") {
        line = line[..idx].trim();
    }
    if let Some(idx) = line.find(" //") {
        line = line[..idx].trim();
    }

    line
}

/// Split a line into tokens on unquoted whitespace
///
/// Single or double quotes group text (including whitespace) and are
/// dropped from the token. There are no escape sequences.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(Error::Parse(format!("unterminated {} quote", q)));
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

/// An open heredoc waiting for its terminator
#[derive(Debug)]
pub struct Heredoc {
    /// Command text before `<<`
    pub prefix: String,
    /// Terminator line
    pub marker: String,
    /// 1-based line of the opening command
    pub start_line: usize,
    buffer: String,
}

/// What a raw line means to an open heredoc
#[derive(Debug, PartialEq, Eq)]
pub enum HeredocLine {
    /// Line was captured
    Captured,
    /// Line was the terminator; holds the captured text
    Closed(String),
}

impl Heredoc {
    /// Open a heredoc if the cleaned line contains `<<`
    pub fn open(cleaned: &str, line: usize) -> Result<Option<Self>> {
        let Some(idx) = cleaned.find(HEREDOC_OPEN) else {
            return Ok(None);
        };

        let prefix = cleaned[..idx].trim();
        let marker = cleaned[idx + HEREDOC_OPEN.len()..].trim();

        if prefix.is_empty() {
            return Err(Error::Parse("heredoc without a command".to_string()));
        }
        if marker.is_empty() {
            return Err(Error::Parse("heredoc marker missing after '<<'".to_string()));
        }

        Ok(Some(Self {
            prefix: prefix.to_string(),
            marker: marker.to_string(),
            start_line: line,
            buffer: String::new(),
        }))
    }

    /// Feed the next raw (unprocessed) script line
    pub fn feed(&mut self, raw: &str) -> HeredocLine {
        if raw.trim() == self.marker {
            let mut text = std::mem::take(&mut self.buffer);
            if text.ends_with('\n') {
                text.pop();
            }
            return HeredocLine::Closed(text);
        }

        self.buffer.push_str(raw);
        self.buffer.push('\n');
        HeredocLine::Captured
    }

    /// Error for a script that ended before the terminator
    pub fn unterminated(&self) -> Error {
        Error::Parse(format!("heredoc marker '{}' not found", self.marker)).at_line(self.start_line)
    }
}
