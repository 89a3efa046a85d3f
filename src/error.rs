//! Error types and reporting for the shell.
//!
//! Parsing and command-tree construction return `ShellError`, which carries a
//! kind and a human-readable message. Operating-system-facing code (spawn,
//! wait, kill, chdir) uses `std::io::Result` instead and is converted to a
//! one-line stderr message at the REPL boundary.

use std::fmt;

/// Categorized error types for better diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated quote or other tokenization failure.
    Tokenize,
    /// Malformed command tree (e.g. a pipe with an empty stage).
    Parse,
    /// A job-table or history lookup failed.
    Lookup,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Tokenize => write!(f, "tokenize error"),
            ErrorKind::Parse => write!(f, "parse error"),
            ErrorKind::Lookup => write!(f, "lookup error"),
        }
    }
}

/// Rich error type with a kind and a human-readable message.
#[derive(Debug, Clone)]
pub struct ShellError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ShellError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ShellError {
            kind,
            message: message.into(),
        }
    }

    pub fn tokenize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Tokenize, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn no_such_job(n: usize) -> Self {
        Self::new(ErrorKind::Lookup, format!("no such job: {n}"))
    }

    pub fn no_record_for(n: usize) -> Self {
        Self::new(ErrorKind::Lookup, format!("no record for: {n}"))
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ShellError {}

/// Convenience type alias for Results with `ShellError`.
pub type ShellResult<T> = Result<T, ShellError>;
