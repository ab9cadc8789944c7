// src/cli.rs

use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Count distinct changes per author in a git log", long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Read a captured log stream from this file instead of walking the repository
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Only commits at or after this time (example: "2023-03-01" or "2 weeks")
    #[arg(long, value_parser = parse_time)]
    pub since: Option<NaiveDateTime>,

    /// Only commits at or before this time (example: "Mar 27 2023 00:00:00")
    #[arg(long, value_parser = parse_time)]
    pub until: Option<NaiveDateTime>,

    /// Only commits whose "Name <email>" matches this regex
    #[arg(long)]
    pub author: Option<String>,

    /// Ref pattern to walk, may be repeated (example: "*Features*")
    #[arg(long = "glob")]
    pub globs: Vec<String>,

    /// Skip every commit by this author email
    #[arg(long)]
    pub exclude_author: Option<String>,

    /// Email regex defining a group that gets a separate sum
    #[arg(long)]
    pub group_pattern: Option<String>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Write the report here instead of stdout (xlsx defaults to result.xlsx)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (default: git-tally.toml in the repository, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// More log output; repeat for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// `--output` if given; a workbook cannot go to stdout, so xlsx falls back
    /// to `DEFAULT_XLSX_OUTPUT`.
    pub fn output_path(&self, format: Format) -> Option<PathBuf> {
        match (&self.output, format) {
            (Some(path), _) => Some(path.clone()),
            (None, Format::Xlsx) => Some(PathBuf::from(DEFAULT_XLSX_OUTPUT)),
            (None, _) => None,
        }
    }
}

#[derive(clap::ValueEnum, Deserialize, Clone, Debug, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Aligned text columns
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Excel workbook with sum formulas; written to result.xlsx unless --output is given
    Xlsx,
}

/// Where the report goes when --output is not given
pub const DEFAULT_XLSX_OUTPUT: &str = "result.xlsx";

/// Absolute (`2023-03-27`, `2023-03-27 12:30:00`, `Mar 27 2023 00:00:00`)
/// or relative to now (`2 weeks`, `3 days ago`).
pub fn parse_time(value: &str) -> Result<NaiveDateTime, String> {
    parse_time_at(value, Utc::now().naive_utc())
}

fn parse_time_at(value: &str, now: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%b %d %Y %H:%M:%S"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(time);
        }
    }
    if let Some(time) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(time);
    }

    let span: String = value
        .strip_suffix("ago")
        .unwrap_or(value)
        .split_whitespace()
        .collect();
    let ago = humantime::parse_duration(&span)
        .map_err(|e| format!("expected a date or a span like \"2 weeks\", got {value:?}: {e}"))?;
    let ago = chrono::Duration::from_std(ago).map_err(|e| format!("{value:?}: {e}"))?;
    now.checked_sub_signed(ago)
        .ok_or_else(|| format!("{value:?} reaches too far back"))
}
