//! One builder per logical section. Each writes only into the sheet it is handed.

pub mod regions;
pub mod related;
pub mod stock;
pub mod summary;
pub mod trending;

use chrono::{Datelike, NaiveDate};
use std::fmt;

// Worksheet limits of the xlsx format.
pub(crate) const MAX_TEXT_CHARS: usize = 32_767;
pub(crate) const MAX_COLUMNS: usize = 16_384;
pub(crate) const MAX_ROWS: u32 = 1_048_576;
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

/// A malformed slice of the bundle detected while laying out one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionError {
    pub section: String,
    pub detail: String,
}

impl SectionError {
    pub fn new(section: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section error (sheet={}): {}", self.section, self.detail)
    }
}

impl std::error::Error for SectionError {}

pub(crate) fn ensure_finite(section: &str, what: &str, n: f64) -> Result<f64, SectionError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(SectionError::new(section, format!("{what} is not a finite number ({n})")))
    }
}

pub(crate) fn ensure_text<'a>(section: &str, what: &str, s: &'a str) -> Result<&'a str, SectionError> {
    let chars = s.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(SectionError::new(
            section,
            format!("{what} is {chars} characters; a cell holds at most {MAX_TEXT_CHARS}"),
        ));
    }
    Ok(s)
}

pub(crate) fn ensure_date(section: &str, date: NaiveDate) -> Result<NaiveDate, SectionError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(SectionError::new(
            section,
            format!("date {date} is outside the spreadsheet range {MIN_YEAR}-{MAX_YEAR}"),
        ))
    }
}

pub(crate) fn ensure_row(section: &str, row: u32) -> Result<u32, SectionError> {
    if row < MAX_ROWS {
        Ok(row)
    } else {
        Err(SectionError::new(section, format!("row {row} is past the last sheet row")))
    }
}

/// Scores are usually integral; print them without a trailing ".0".
pub(crate) fn format_score(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
