// src/error.rs

//! Fatal errors. Any of these aborts the whole run; no partial summary is
//! produced because an under- or over-count would be silently wrong.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TallyError {
    /// A non-blank block does not start with the expected header.
    #[error("could not parse record {index}: {excerpt}")]
    MalformedRecord { index: usize, excerpt: String },

    /// A single record carries more than one `Change-Id` trailer.
    #[error("multiple change ids in record {index} ({hash})")]
    MultipleChangeIds { index: usize, hash: String },

    /// Two unrelated commits claim the same change-id.
    #[error("commits with the same id {change_id} differ:\n  {existing}\n  {incoming}")]
    ChangeIdCollision {
        change_id: String,
        existing: String,
        incoming: String,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T, E = TallyError> = std::result::Result<T, E>;
