// src/source.rs

use crate::error::Result;
use crate::extractor::SENTINEL;
use chrono::{NaiveDateTime, TimeZone, Utc};
use git2::{Commit, Repository, Sort};
use indicatif::ProgressBar;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// Which commits to read from the repository
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Inclusive lower bound on the commit time (UTC)
    pub since: Option<NaiveDateTime>,
    /// Inclusive upper bound on the commit time (UTC)
    pub until: Option<NaiveDateTime>,
    /// Regex matched against `Name <email>`
    pub author: Option<String>,
    /// Ref globs to walk; `HEAD` when empty
    pub globs: Vec<String>,
}

/// Walks the repository and renders every matching non-merge commit as one
/// record block, newest first.
pub fn read_log(repo_path: &Path, query: &LogQuery) -> Result<String> {
    let repo = Repository::open(repo_path)?;
    info!(repo = %repo_path.display(), "reading log");

    let author = query.author.as_deref().map(Regex::new).transpose()?;
    let since = query.since.map(|t| Utc.from_utc_datetime(&t).timestamp());
    let until = query.until.map(|t| Utc.from_utc_datetime(&t).timestamp());

    let mut revwalk = repo.revwalk()?;
    if query.globs.is_empty() {
        revwalk.push_head()?;
    } else {
        for glob in &query.globs {
            revwalk.push_glob(glob)?;
        }
    }
    revwalk.set_sorting(Sort::TIME)?;

    let bar = ProgressBar::new_spinner();
    bar.set_message("Reading commits");

    let mut stream = String::new();
    let mut written = 0usize;
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        bar.inc(1);

        if commit.parent_count() > 1 {
            continue;
        }
        let time = commit.time().seconds();
        if since.is_some_and(|s| time < s) || until.is_some_and(|u| time > u) {
            continue;
        }
        if let Some(pattern) = &author {
            let sig = commit.author();
            let who = format!(
                "{} <{}>",
                String::from_utf8_lossy(sig.name_bytes()),
                String::from_utf8_lossy(sig.email_bytes())
            );
            if !pattern.is_match(&who) {
                continue;
            }
        }

        write_record(&mut stream, &commit)?;
        written += 1;
    }
    bar.finish_with_message("Commits read");

    info!(commits = written, "log read");
    Ok(stream)
}

/// `Hash:%h Email:%ae Name:%an Subj:%s Body:%b` followed by the sentinel
fn write_record(stream: &mut String, commit: &Commit) -> Result<()> {
    let short_id = commit.as_object().short_id()?;
    let hash = short_id.as_str().unwrap_or_default();
    let author = commit.author();
    let subject = commit.summary().unwrap_or_default();
    let body = commit.body().unwrap_or_default();
    debug!(hash, subject, "rendering commit");

    stream.push_str("Hash:");
    stream.push_str(hash);
    stream.push_str(" Email:");
    stream.push_str(&String::from_utf8_lossy(author.email_bytes()));
    stream.push_str(" Name:");
    stream.push_str(&String::from_utf8_lossy(author.name_bytes()));
    stream.push_str(" Subj:");
    stream.push_str(subject);
    stream.push_str(" Body:");
    stream.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        stream.push('\n');
    }
    stream.push_str(SENTINEL);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parse_log;
    use crate::model::SummaryEntry;
    use chrono::NaiveDate;
    use git2::{Oid, Signature, Time};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const DAY: i64 = 86_400;
    // 2023-03-01 00:00:00 UTC
    const BASE: i64 = 1_677_628_800;

    struct Fixture {
        _dir: TempDir,
        repo: Repository,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let repo = Repository::init(dir.path()).unwrap();
            Self { _dir: dir, repo }
        }

        fn path(&self) -> &Path {
            self.repo.workdir().unwrap()
        }

        fn commit(&self, name: &str, email: &str, day: i64, message: &str) -> Oid {
            let head = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
            let parents: Vec<&Commit> = head.iter().collect();
            self.commit_with_parents(name, email, day, message, &parents, Some("HEAD"))
        }

        fn commit_with_parents(
            &self,
            name: &str,
            email: &str,
            day: i64,
            message: &str,
            parents: &[&Commit],
            update_ref: Option<&str>,
        ) -> Oid {
            let sig = Signature::new(name, email, &Time::new(BASE + day * DAY, 0)).unwrap();
            let tree_id = self.repo.treebuilder(None).unwrap().write().unwrap();
            let tree = self.repo.find_tree(tree_id).unwrap();
            self.repo
                .commit(update_ref, &sig, &sig, message, &tree, parents)
                .unwrap()
        }
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn renders_records_the_extractor_understands() {
        let fx = Fixture::new();
        fx.commit("John Doe", "John.Doe@example.com", 0, "Fix 1\n\nThe change\n\nChange-Id: i001\n");
        fx.commit("John Doe", "john.doe@example.com", 1, "Fix 2\n\nChange-Id: i002\n");
        fx.commit("Dr Who", "drwho@example.com", 2, "Fix 3\n\nChange-Id: i003");

        let stream = read_log(fx.path(), &LogQuery::default()).unwrap();
        assert_eq!(stream.matches(SENTINEL).count(), 3);

        let tally = parse_log(&stream, None).unwrap();
        assert_eq!(
            tally.entries,
            vec![
                SummaryEntry::new("Dr Who", "drwho@example.com", 1),
                SummaryEntry::new("John Doe", "john.doe@example.com", 2),
            ]
        );
        assert!(tally.diagnostics.is_empty());
    }

    #[test]
    fn commit_without_body_still_parses() {
        let fx = Fixture::new();
        fx.commit("A", "a@x.com", 0, "Only a subject");

        let stream = read_log(fx.path(), &LogQuery::default()).unwrap();
        assert!(stream.starts_with("Hash:"));
        assert!(stream.contains("Subj:Only a subject Body:<end-of-commit-message>\n"));

        let tally = parse_log(&stream, None).unwrap();
        assert_eq!(tally.entries, vec![SummaryEntry::new("A", "a@x.com", 1)]);
        assert_eq!(tally.diagnostics.len(), 1);
    }

    #[test]
    fn record_text_follows_log_format() {
        let fx = Fixture::new();
        fx.commit("John Doe", "john.doe@example.com", 0, "Fix 1\n\nChange-Id: i1");

        let stream = read_log(fx.path(), &LogQuery::default()).unwrap();
        assert!(stream.starts_with("Hash:"));
        assert!(stream.ends_with(
            " Email:john.doe@example.com Name:John Doe Subj:Fix 1 Body:Change-Id: i1\n<end-of-commit-message>\n"
        ));
    }

    #[test]
    fn filters_by_date_range() {
        let fx = Fixture::new();
        fx.commit("A", "a@x.com", 0, "Day 0\n\nChange-Id: i0");
        fx.commit("A", "a@x.com", 5, "Day 5\n\nChange-Id: i5");
        fx.commit("A", "a@x.com", 10, "Day 10\n\nChange-Id: i10");

        let query = LogQuery {
            since: Some(at(2023, 3, 2)),
            until: Some(at(2023, 3, 8)),
            ..LogQuery::default()
        };
        let stream = read_log(fx.path(), &query).unwrap();
        assert!(stream.contains("Subj:Day 5 "));
        assert_eq!(stream.matches(SENTINEL).count(), 1);
    }

    #[test]
    fn filters_by_author_pattern() {
        let fx = Fixture::new();
        fx.commit("Alice", "alice@x.com", 0, "One\n\nChange-Id: i1");
        fx.commit("Bob", "bob@y.com", 1, "Two\n\nChange-Id: i2");

        let query = LogQuery {
            author: Some("@y\\.com>$".into()),
            ..LogQuery::default()
        };
        let stream = read_log(fx.path(), &query).unwrap();
        assert!(stream.contains("Email:bob@y.com"));
        assert!(!stream.contains("alice"));
    }

    #[test]
    fn invalid_author_pattern_is_an_error() {
        let fx = Fixture::new();
        fx.commit("A", "a@x.com", 0, "One");
        let query = LogQuery {
            author: Some("(".into()),
            ..LogQuery::default()
        };
        assert!(read_log(fx.path(), &query).is_err());
    }

    #[test]
    fn skips_merge_commits() {
        let fx = Fixture::new();
        let base = fx.commit("A", "a@x.com", 0, "Base\n\nChange-Id: i0");
        let base = fx.repo.find_commit(base).unwrap();
        let side = fx.commit_with_parents("B", "b@x.com", 1, "Side\n\nChange-Id: i1", &[&base], None);
        let side = fx.repo.find_commit(side).unwrap();
        let main = fx.commit("A", "a@x.com", 2, "Main\n\nChange-Id: i2");
        let main = fx.repo.find_commit(main).unwrap();
        fx.commit_with_parents("A", "a@x.com", 3, "Merge side", &[&main, &side], Some("HEAD"));

        let stream = read_log(fx.path(), &LogQuery::default()).unwrap();
        assert_eq!(stream.matches(SENTINEL).count(), 3);
        assert!(!stream.contains("Merge side"));
    }

    #[test]
    fn walks_only_matching_refs() {
        let fx = Fixture::new();
        let base = fx.commit("A", "a@x.com", 0, "Base\n\nChange-Id: i0");
        let base = fx.repo.find_commit(base).unwrap();
        fx.commit_with_parents(
            "B",
            "b@x.com",
            1,
            "Feature\n\nChange-Id: i1",
            &[&base],
            Some("refs/heads/Features-1"),
        );

        let head_only = read_log(fx.path(), &LogQuery::default()).unwrap();
        assert!(!head_only.contains("Subj:Feature"));

        let query = LogQuery {
            globs: vec!["refs/heads/*Features*".into()],
            ..LogQuery::default()
        };
        let features = read_log(fx.path(), &query).unwrap();
        assert!(features.contains("Subj:Feature"));
        assert!(features.contains("Subj:Base"));
    }
}
