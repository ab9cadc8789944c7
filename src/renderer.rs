// src/renderer.rs

use crate::cli::Format;
use crate::error::Result;
use crate::model::*;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_xlsxwriter::{Format as XlsxFormat, Formula, Workbook};
use serde::Serialize;
use std::io::Write;

/// What the report header and footer describe
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub since: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
    pub author: Option<String>,
    pub globs: Vec<String>,
    /// Rows whose email matches this regex get a separate sum
    pub group_pattern: Option<String>,
    pub generated_on: Option<NaiveDate>,
}

/// Sum over the rows matched by the group pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSum {
    pub pattern: String,
    /// Positions in `Report::rows`
    pub rows: Vec<usize>,
    pub changes: usize,
}

/// The tally laid out for people: header, one row per author, totals, footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: String,
    pub rows: Vec<SummaryEntry>,
    pub total: usize,
    pub group: Option<GroupSum>,
    pub footer: String,
}

impl Report {
    pub fn build(entries: &[SummaryEntry], options: &ReportOptions) -> Result<Self> {
        let mut title = String::from("Commits");
        if let Some(since) = options.since {
            title.push_str(&format!(" since {since}"));
        }
        if let Some(until) = options.until {
            title.push_str(&format!(" until {until}"));
        }

        let group = match options.group_pattern.as_deref() {
            Some(pattern) => {
                // anchored at the start, like a prefix match on the email
                let re = Regex::new(&format!("^(?:{pattern})"))?;
                let rows: Vec<usize> = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| re.is_match(&e.author_email))
                    .map(|(i, _)| i)
                    .collect();
                (!rows.is_empty()).then(|| GroupSum {
                    pattern: pattern.to_string(),
                    changes: rows.iter().map(|&i| entries[i].change_count).sum(),
                    rows,
                })
            }
            None => None,
        };

        let generated_on = options
            .generated_on
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut footer = format!("Generated on {}", generated_on.format("%B %d, %Y"));
        if let Some(author) = &options.author {
            footer.push_str(&format!(" for author {author}"));
        }
        if !options.globs.is_empty() {
            footer.push_str(&format!(" with globs {}", options.globs.join(",")));
        }

        Ok(Self {
            title,
            rows: entries.to_vec(),
            total: entries.iter().map(|e| e.change_count).sum(),
            group,
            footer,
        })
    }

    pub fn write(&self, format: Format, out: &mut impl Write) -> Result<()> {
        match format {
            Format::Table => self.write_table(out),
            Format::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)?;
                Ok(())
            }
            Format::Xlsx => {
                out.write_all(&self.to_xlsx()?)?;
                Ok(())
            }
        }
    }

    /// One worksheet: bold header, data rows, then `SUM` formulas over the
    /// count column for all rows and for the group rows.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = XlsxFormat::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_column_width(0, 20)?;
        sheet.set_column_width(1, 25)?;

        sheet.write_string_with_format(0, 0, "Author", &bold)?;
        sheet.write_string_with_format(0, 1, "Email", &bold)?;
        sheet.write_string_with_format(0, 2, &self.title, &bold)?;

        let first_data_row: u32 = 1;
        let mut row = first_data_row;
        for entry in &self.rows {
            sheet.write_string(row, 0, &entry.author_name)?;
            sheet.write_string(row, 1, &entry.author_email)?;
            sheet.write_number(row, 2, entry.change_count as f64)?;
            row += 1;
        }

        // one blank row before the totals
        row += 1;
        sheet.write_string_with_format(row, 0, "Sum all:", &bold)?;
        if self.rows.is_empty() {
            sheet.write_number(row, 2, 0)?;
        } else {
            let formula = format!("=SUM({}:{})", count_cell(first_data_row), count_cell(row - 2));
            sheet.write_formula(row, 2, Formula::new(formula).set_result(self.total.to_string()))?;
        }

        if let Some(group) = &self.group {
            row += 1;
            let cells: Vec<String> = group
                .rows
                .iter()
                .map(|&i| count_cell(first_data_row + i as u32))
                .collect();
            sheet.write_string_with_format(row, 0, &format!("Sum group ({}):", group.rows.len()), &bold)?;
            sheet.write_string(row, 1, &group.pattern)?;
            let formula = format!("=SUM({})", cells.join(","));
            sheet.write_formula(row, 2, Formula::new(formula).set_result(group.changes.to_string()))?;
        }

        row += 2;
        sheet.write_string(row, 0, &self.footer)?;

        Ok(workbook.save_to_buffer()?)
    }

    fn write_table(&self, out: &mut impl Write) -> Result<()> {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.author_name.chars().count())
            .chain(["Author".len(), "Sum all:".len()])
            .max()
            .unwrap_or(0);
        let email_width = self
            .rows
            .iter()
            .map(|r| r.author_email.chars().count())
            .chain(["Email".len()])
            .max()
            .unwrap_or(0);

        writeln!(out, "{:<name_width$}  {:<email_width$}  {}", "Author", "Email", self.title)?;
        for row in &self.rows {
            writeln!(
                out,
                "{:<name_width$}  {:<email_width$}  {}",
                row.author_name, row.author_email, row.change_count
            )?;
        }
        writeln!(out)?;
        writeln!(out, "{:<name_width$}  {:<email_width$}  {}", "Sum all:", "", self.total)?;
        if let Some(group) = &self.group {
            let label = format!("Sum group ({}):", group.rows.len());
            writeln!(out, "{label:<name_width$}  {:<email_width$}  {}", group.pattern, group.changes)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", self.footer)?;
        Ok(())
    }
}

/// A1-style reference to the count column (C) of a zero-based row
fn count_cell(row: u32) -> String {
    format!("C{}", row + 1)
}
