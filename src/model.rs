// src/model.rs

use serde::Serialize;
use std::fmt;

/// Diagnostics show at most this many characters of a record
pub const MAX_EXCERPT_CHARS: usize = 120;

/// One commit as read from the log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub hash: String,
    /// Always lowercase, used as the grouping key
    pub author_email: String,
    pub author_name: String,
    pub subject: String,
    /// Value of the `Change-Id` trailer, or the hash when the trailer is absent
    pub change_id: String,
    /// The body mentions a cherry-pick origin
    pub is_cherry_pick: bool,
}

impl fmt::Display for ParsedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = format!(
            "{} {} <{}> [{}]{} {}",
            self.hash,
            self.author_name,
            self.author_email,
            self.change_id,
            if self.is_cherry_pick { " (cherry-pick)" } else { "" },
            self.subject,
        );
        f.write_str(&excerpt(&line))
    }
}

/// One output row: how many distinct changes an author made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub author_name: String,
    pub author_email: String,
    pub change_count: usize,
}

impl SummaryEntry {
    pub fn new(author_name: &str, author_email: &str, change_count: usize) -> Self {
        Self {
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
            change_count,
        }
    }
}

/// A non-fatal finding. Never changes the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The record has no `Change-Id` trailer; its hash stands in
    MissingChangeId { index: usize, record: ParsedRecord },
    /// Same change-id, subjects related by containment (usually a cherry-pick)
    ChangeIdVariant {
        change_id: String,
        canonical: ParsedRecord,
        variant: ParsedRecord,
    },
    /// Same author and subject logged under two change-ids
    Resubmitted {
        canonical: ParsedRecord,
        duplicate: ParsedRecord,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingChangeId { index, record } => {
                write!(f, "no change id in record {index}: {record}")
            }
            Diagnostic::ChangeIdVariant { change_id, canonical, variant } => write!(
                f,
                "commits with the same id {change_id} differ:\n  {canonical}\n  {variant}"
            ),
            Diagnostic::Resubmitted { canonical, duplicate } => write!(
                f,
                "commits with the same subject differ:\n  {canonical}\n  {duplicate}"
            ),
        }
    }
}

/// The result of a full parse: the summary plus everything worth a warning
#[derive(Debug, Default)]
pub struct Tally {
    pub entries: Vec<SummaryEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Cuts `text` to `MAX_EXCERPT_CHARS` characters, marking the cut with `...`
pub fn excerpt(text: &str) -> String {
    let text = text.trim_end();
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
