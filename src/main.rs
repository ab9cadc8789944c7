// src/main.rs

mod analyzer;
mod cli;
mod config;
mod error;
mod extractor;
mod model;
mod renderer;
mod source;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::Config;
use renderer::{Report, ReportOptions};
use source::LogQuery;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use tracing::info;

fn main() {
    let args = Args::parse();
    telemetry::init(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = Config::load(args.config.as_deref(), &args.repo)?.merge_args(args);

    let stream = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read log stream: {}", path.display()))?,
        None => {
            let query = LogQuery {
                since: args.since,
                until: args.until,
                author: config.log.author.clone(),
                globs: config.log.globs.clone(),
            };
            source::read_log(&args.repo, &query)
                .with_context(|| format!("Failed to read log of {}", args.repo.display()))?
        }
    };

    let tally = analyzer::parse_log(&stream, config.report.exclude_author.as_deref())
        .context("Failed to tally the log")?;
    info!(
        authors = tally.entries.len(),
        warnings = tally.diagnostics.len(),
        elapsed = ?start_time.elapsed(),
        "tally finished"
    );

    let report = Report::build(
        &tally.entries,
        &ReportOptions {
            since: args.since,
            until: args.until,
            author: config.log.author.clone(),
            globs: config.log.globs.clone(),
            group_pattern: config.report.group_pattern.clone(),
            generated_on: None,
        },
    )?;

    match &args.output_path(config.report.format) {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            report.write(config.report.format, &mut out)?;
            out.flush()?;
            info!(output = %path.display(), "report written");
        }
        None => {
            let stdout = io::stdout();
            report.write(config.report.format, &mut stdout.lock())?;
        }
    }

    Ok(())
}
