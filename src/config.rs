// src/config.rs

//! Optional `git-tally.toml`. Every field has a default and a missing file
//! means all defaults. Command-line flags take precedence.

use crate::cli::{Args, Format};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_NAME: &str = "git-tally.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Which commits to read
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default)]
    pub globs: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub exclude_author: Option<String>,
    #[serde(default)]
    pub group_pattern: Option<String>,
    #[serde(default)]
    pub format: Format,
}

impl Config {
    /// Loads `explicit` if given (it must exist), otherwise the default file
    /// in `repo` when there is one.
    pub fn load(explicit: Option<&Path>, repo: &Path) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = repo.join(DEFAULT_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Command-line values win; globs from the command line replace the
    /// configured list rather than extending it.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if !args.globs.is_empty() {
            self.log.globs = args.globs.clone();
        }
        if args.author.is_some() {
            self.log.author = args.author.clone();
        }
        if args.exclude_author.is_some() {
            self.report.exclude_author = args.exclude_author.clone();
        }
        if args.group_pattern.is_some() {
            self.report.group_pattern = args.group_pattern.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        self
    }
}
