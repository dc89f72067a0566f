//! In-memory layout of a report workbook.
//!
//! Section builders write into [`Sheet`] values; [`crate::report::xlsx`] turns
//! the finished [`Document`] into a file. Row and column indices are 0-based.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sheets: Vec<Sheet>,
}

impl Document {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    Title,
    Header,
    Subtitle,
    Wrapped,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRange {
    pub range: CellRange,
    pub text: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub name: CellRef,
    pub categories: CellRange,
    pub values: CellRange,
}

/// Line chart over ranges of the sheet it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub series: Vec<SeriesSpec>,
    pub anchor: CellRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub cells: BTreeMap<(u32, u16), Cell>,
    pub merges: Vec<MergedRange>,
    pub column_widths: BTreeMap<u16, f64>,
    pub charts: Vec<ChartSpec>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
            column_widths: BTreeMap::new(),
            charts: Vec::new(),
        }
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn write(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn write_text(&mut self, row: u32, col: u16, text: impl Into<String>) {
        self.write(row, col, CellValue::Text(text.into()), CellStyle::Plain);
    }

    pub fn write_number(&mut self, row: u32, col: u16, n: f64) {
        self.write(row, col, CellValue::Number(n), CellStyle::Plain);
    }

    pub fn write_header_row(&mut self, row: u32, headers: &[&str]) {
        for (col, header) in headers.iter().enumerate() {
            self.write(
                row,
                col as u16,
                CellValue::Text((*header).to_string()),
                CellStyle::Header,
            );
        }
    }

    /// Merges a single row across `first_col..=last_col`. A one-column span is a plain cell.
    pub fn merge_row(
        &mut self,
        row: u32,
        first_col: u16,
        last_col: u16,
        text: impl Into<String>,
        style: CellStyle,
    ) {
        let text = text.into();
        if first_col == last_col {
            self.write(row, first_col, CellValue::Text(text), style);
            return;
        }
        self.merges.push(MergedRange {
            range: CellRange {
                first_row: row,
                first_col,
                last_row: row,
                last_col,
            },
            text,
            style,
        });
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col)).map(|c| &c.value)
    }

    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        self.cell(row, col).and_then(CellValue::as_text)
    }

    /// Text of the merged range starting at `row`, if any.
    pub fn merged_text(&self, row: u32) -> Option<&str> {
        self.merges
            .iter()
            .find(|m| m.range.first_row == row)
            .map(|m| m.text.as_str())
    }

    /// Highest row index holding a cell or merged range.
    pub fn last_row(&self) -> Option<u32> {
        let cells = self.cells.keys().map(|(r, _)| *r).max();
        let merges = self.merges.iter().map(|m| m.range.last_row).max();
        cells.max(merges)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.is_empty() && self.merges.is_empty()
    }
}
