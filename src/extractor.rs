// src/extractor.rs

use crate::error::{Result, TallyError};
use crate::model::*;
use tracing::{debug, warn};

/// Marker the log producer writes after every record
pub const SENTINEL: &str = "<end-of-commit-message>\n";

/// Every pattern the record format depends on. Format drift is fixed here.
pub mod patterns {
    use regex::Regex;
    use std::sync::LazyLock;

    /// Header at the very start of a block. `.` stops at newlines, so name
    /// and subject cannot run into the body.
    pub static HEADER: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"^Hash:(?P<hash>\S+)\s+Email:(?P<email>\S+)\s+Name:(?P<name>.+)\s+Subj:(?P<subject>.+)\s+Body:",
        )
        .expect("header pattern is valid")
    });

    /// A `Change-Id` trailer. The start of the body counts as a line start.
    pub static CHANGE_ID: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^Change-Id:[ \t]*(?P<id>\S+)").expect("change-id pattern is valid")
    });

    pub static CHERRY_PICK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)cherry[- ]pick").expect("cherry-pick pattern is valid"));
}

/// Records that survived the author filter, in stream order
#[derive(Debug, Default)]
pub struct Extracted {
    pub records: Vec<ParsedRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Splits `stream` into blocks and parses each one.
///
/// Records whose email equals `exclude_author` (case-insensitive) are dropped
/// before any validation, so they never show up in diagnostics.
pub fn extract(stream: &str, exclude_author: Option<&str>) -> Result<Extracted> {
    let exclude_author = exclude_author.map(str::to_lowercase);
    let mut extracted = Extracted::default();

    for (index, block) in stream.split(SENTINEL).enumerate() {
        if block.trim().is_empty() {
            continue;
        }

        let (record, body) = parse_header(index, block)?;

        if exclude_author.as_deref() == Some(record.author_email.as_str()) {
            debug!(index, email = %record.author_email, "skipping excluded author");
            continue;
        }

        let record = attach_change_id(index, record, body, &mut extracted.diagnostics)?;
        debug!(index, %record, "parsed record");
        extracted.records.push(record);
    }

    Ok(extracted)
}

/// Parses the header fields. The change-id is left as the hash; the returned
/// slice is the body text following `Body:`.
fn parse_header(index: usize, block: &str) -> Result<(ParsedRecord, &str)> {
    let caps = patterns::HEADER
        .captures(block)
        .ok_or_else(|| TallyError::MalformedRecord {
            index,
            excerpt: excerpt(block),
        })?;

    let header_end = caps.get(0).map_or(0, |m| m.end());
    let body = &block[header_end..];
    let hash = caps["hash"].to_string();

    let record = ParsedRecord {
        change_id: hash.clone(),
        hash,
        author_email: caps["email"].to_lowercase(),
        author_name: caps["name"].trim().to_string(),
        subject: caps["subject"].trim().to_string(),
        is_cherry_pick: patterns::CHERRY_PICK.is_match(body),
    };
    Ok((record, body))
}

fn attach_change_id(
    index: usize,
    mut record: ParsedRecord,
    body: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ParsedRecord> {
    let mut trailers = patterns::CHANGE_ID.captures_iter(body);

    match (trailers.next(), trailers.next()) {
        (Some(caps), None) => {
            record.change_id = caps["id"].to_string();
        }
        (Some(_), Some(_)) => {
            return Err(TallyError::MultipleChangeIds {
                index,
                hash: record.hash,
            });
        }
        (None, _) => {
            warn!(index, hash = %record.hash, "no change id, falling back to the hash");
            diagnostics.push(Diagnostic::MissingChangeId {
                index,
                record: record.clone(),
            });
        }
    }

    Ok(record)
}
