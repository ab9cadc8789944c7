// src/analyzer.rs

use crate::error::{Result, TallyError};
use crate::extractor;
use crate::model::*;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{info, warn};

/// Identity indexes for one run. First seen wins in both.
#[derive(Debug, Default)]
pub struct DedupIndexes {
    pub by_change_id: HashMap<String, ParsedRecord>,
    /// email -> subject -> record, in first-seen order at both levels
    pub by_author_subject: IndexMap<String, IndexMap<String, ParsedRecord>>,
}

/// Output of reconciliation, before extractor diagnostics are merged in
#[derive(Debug, Default)]
pub struct Reconciled {
    pub indexes: DedupIndexes,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses a raw log stream and folds it into a per-author summary.
pub fn parse_log(stream: &str, exclude_author: Option<&str>) -> Result<Tally> {
    let extracted = extractor::extract(stream, exclude_author)?;
    let reconciled = reconcile(&extracted.records)?;
    let entries = summarize(&reconciled.indexes);

    info!(
        records = extracted.records.len(),
        authors = entries.len(),
        warnings = extracted.diagnostics.len() + reconciled.diagnostics.len(),
        "log parsed"
    );

    let mut diagnostics = extracted.diagnostics;
    diagnostics.extend(reconciled.diagnostics);
    Ok(Tally { entries, diagnostics })
}

/// Runs both identity checks over `records` in order.
pub fn reconcile(records: &[ParsedRecord]) -> Result<Reconciled> {
    let mut reconciled = Reconciled::default();

    for record in records {
        if check_change_id(record, &mut reconciled)? {
            check_author_subject(record, &mut reconciled);
        }
    }

    Ok(reconciled)
}

/// Returns false when `record` is a variant of an earlier change by the same
/// author and must not be counted on its own. Variants by another author
/// still go on to the author+subject check so that author gets a row.
fn check_change_id(record: &ParsedRecord, reconciled: &mut Reconciled) -> Result<bool> {
    let existing = match reconciled.indexes.by_change_id.get(&record.change_id) {
        Some(existing) => existing,
        None => {
            reconciled
                .indexes
                .by_change_id
                .insert(record.change_id.clone(), record.clone());
            return Ok(true);
        }
    };

    if existing.author_email == record.author_email && existing.subject == record.subject {
        return Ok(true);
    }

    if !subjects_related(&existing.subject, &record.subject) {
        return Err(TallyError::ChangeIdCollision {
            change_id: record.change_id.clone(),
            existing: existing.to_string(),
            incoming: record.to_string(),
        });
    }

    let diagnostic = Diagnostic::ChangeIdVariant {
        change_id: record.change_id.clone(),
        canonical: existing.clone(),
        variant: record.clone(),
    };
    warn!(
        change_id = %record.change_id,
        cherry_pick = existing.is_cherry_pick || record.is_cherry_pick,
        "{diagnostic}"
    );
    let same_author = existing.author_email == record.author_email;
    reconciled.diagnostics.push(diagnostic);
    Ok(!same_author)
}

fn check_author_subject(record: &ParsedRecord, reconciled: &mut Reconciled) {
    let subjects = reconciled
        .indexes
        .by_author_subject
        .entry(record.author_email.clone())
        .or_default();

    match subjects.get(&record.subject) {
        None => {
            subjects.insert(record.subject.clone(), record.clone());
        }
        Some(existing) if existing.change_id == record.change_id => {}
        Some(existing) => {
            let diagnostic = Diagnostic::Resubmitted {
                canonical: existing.clone(),
                duplicate: record.clone(),
            };
            warn!(
                email = %record.author_email,
                cherry_pick = existing.is_cherry_pick || record.is_cherry_pick,
                "{diagnostic}"
            );
            reconciled.diagnostics.push(diagnostic);
        }
    }
}

/// Subjects are treated as the same change when either contains the other.
fn subjects_related(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// One entry per author with at least one retained subject, first-seen order.
pub fn summarize(indexes: &DedupIndexes) -> Vec<SummaryEntry> {
    indexes
        .by_author_subject
        .iter()
        .filter_map(|(email, subjects)| {
            let (_, first) = subjects.first()?;
            Some(SummaryEntry::new(&first.author_name, email, subjects.len()))
        })
        .collect()
}
