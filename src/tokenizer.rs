//! Tokenizer for shell input.
//!
//! Splits a line into raw words (honoring single/double quoting), then groups
//! the words into pipeline segments on the unquoted `|` separator, the way a
//! `shlex`-style scanner with custom word characters would. A lone trailing
//! `&` word on the last segment flips the pipeline into the background and is
//! stripped from that segment.

use crate::command::Segment;
use crate::error::ShellError;

#[derive(Copy, Clone, Eq, PartialEq)]
enum QuoteMode {
    Normal,
    Single,
    Double,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || "#$+-,./?@^=".contains(c)
}

/// Scans `line` into a flat list of words. Whitespace separates words;
/// quoted spans are taken literally and merge with adjacent word-forming
/// runs into a single word; any other punctuation ends the current word and
/// becomes a one-character word of its own (this is how `|` and `&` show up
/// in the stream for the segment splitter below to recognize).
fn raw_tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut buf = String::new();
    let mut in_token = false;
    let mut mode = QuoteMode::Normal;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match mode {
            QuoteMode::Single => {
                if ch == '\'' {
                    mode = QuoteMode::Normal;
                } else {
                    buf.push(ch);
                }
            }
            QuoteMode::Double => {
                if ch == '"' {
                    mode = QuoteMode::Normal;
                } else {
                    buf.push(ch);
                }
            }
            QuoteMode::Normal => match ch {
                '\'' => {
                    in_token = true;
                    mode = QuoteMode::Single;
                }
                '"' => {
                    in_token = true;
                    mode = QuoteMode::Double;
                }
                ' ' | '\t' => {
                    if in_token {
                        words.push(std::mem::take(&mut buf));
                        in_token = false;
                    }
                }
                c if is_word_char(c) => {
                    in_token = true;
                    buf.push(c);
                }
                c => {
                    if in_token {
                        words.push(std::mem::take(&mut buf));
                        in_token = false;
                    }
                    words.push(c.to_string());
                }
            },
        }
    }

    if !matches!(mode, QuoteMode::Normal) {
        return Err(ShellError::tokenize("unterminated quote"));
    }
    if in_token {
        words.push(buf);
    }
    Ok(words)
}

/// Tokenizes `line` into pipeline segments and the trailing background flag.
///
/// Empty input (or input that is only a lone `&`) yields an empty segment
/// list, which the caller treats the same as an empty line.
pub fn tokenize(line: &str) -> Result<(Vec<Segment>, bool), ShellError> {
    let words = raw_tokenize(line)?;

    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for word in words {
        if word == "|" {
            if !current.is_empty() {
                segments.push(Segment::new(std::mem::take(&mut current)));
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        segments.push(Segment::new(current));
    }

    let background = match segments.last_mut() {
        Some(last) if last.words.last().map(String::as_str) == Some("&") => {
            last.words.pop();
            if last.words.is_empty() {
                segments.pop();
            }
            true
        }
        _ => false,
    };

    Ok((segments, background))
}
