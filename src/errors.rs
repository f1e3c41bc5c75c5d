use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an exchange client.
///
/// `InvalidSymbol` is the only variant callers are expected to recover from:
/// it means the exchange does not (or no longer) list the requested pair.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Exchange API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid number in field '{field}': {value}")]
    Number { field: &'static str, value: String },

    #[error("Unsupported exchange: {0}")]
    Unsupported(String),
}

/// Failures reading one of the pairlist JSON documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{message} in {} at line {line} column {column}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unexpected document shape in {} at line {line} column {column}: {message}", .path.display())]
    Shape {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// `Shape` when the JSON parses but holds the wrong types, `Malformed`
    /// for broken syntax.
    pub fn from_json(path: impl Into<PathBuf>, err: &serde_json::Error) -> Self {
        // serde_json appends " at line X column Y" to its Display output
        let full = err.to_string();
        let message = match full.rfind(" at line ") {
            Some(idx) => full[..idx].to_string(),
            None => full,
        };
        let (path, line, column) = (path.into(), err.line(), err.column());

        if err.is_data() {
            DocumentError::Shape { path, line, column, message }
        } else {
            DocumentError::Malformed { path, line, column, message }
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::Io {
            path: path.into(),
            source,
        }
    }
}
