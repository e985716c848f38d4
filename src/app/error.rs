use thiserror::Error;

/// Failures while turning a block body back into bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid escape sequence at byte {0}")]
    InvalidEscape(usize),

    #[error("unescaped backtick at byte {0}")]
    UnescapedBacktick(usize),

    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("block header names no file")]
    MissingPath,
}

/// Errors surfaced by the dump/restore engine.
#[derive(Debug, Error)]
pub enum Error {
    // Fatal, raised before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Front matter was not found")]
    MissingFrontMatter,

    // Per-item, reported and skipped
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to decode block {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to create folder {path}: {source}")]
    DirectoryCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory cycle detected at {0}")]
    CycleDetected(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
