use crate::domain::bundle::StockTrendsTable;
use crate::domain::period::Period;
use crate::report::document::{CellRange, CellRef, CellStyle, CellValue, ChartSpec, SeriesSpec, Sheet};
use crate::report::sections::{
    ensure_date, ensure_finite, ensure_row, ensure_text, SectionError, MAX_COLUMNS,
};
use std::collections::HashSet;

const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;
const MAX_SERIES: usize = 5;

pub fn sheet_name(period: Period) -> String {
    format!("Stock Trends {}", period.label())
}

pub fn chart_title(period: Period) -> String {
    format!("Stock Market Search Interest – {}", period.label())
}

pub fn build(
    sheet: &mut Sheet,
    period: Period,
    table: &StockTrendsTable,
    include_charts: bool,
) -> Result<(), SectionError> {
    // Column 0 holds the date index.
    if table.columns.len() >= MAX_COLUMNS {
        return Err(SectionError::new(
            sheet.name.clone(),
            format!(
                "{} keyword columns do not fit beside the date column ({MAX_COLUMNS} max)",
                table.columns.len()
            ),
        ));
    }
    let keyword_count = table.columns.len() as u16;

    sheet.set_column_width(0, 20.0);
    for col in 1..=keyword_count {
        sheet.set_column_width(col, 15.0);
    }
    sheet.merge_row(
        0,
        0,
        keyword_count,
        format!("Stock Market Search Trends - {}", period.label()),
        CellStyle::Title,
    );

    sheet.write(HEADER_ROW, 0, CellValue::Text("Date".into()), CellStyle::Header);
    for (i, keyword) in table.columns.iter().enumerate() {
        let keyword = ensure_text(&sheet.name, "keyword", keyword)?;
        sheet.write(
            HEADER_ROW,
            1 + i as u16,
            CellValue::Text(keyword.to_string()),
            CellStyle::Header,
        );
    }

    let mut seen_dates = HashSet::with_capacity(table.rows.len());
    for (i, data) in table.rows.iter().enumerate() {
        if data.values.len() != table.columns.len() {
            return Err(SectionError::new(
                sheet.name.clone(),
                format!(
                    "row {} has {} values for {} columns",
                    data.date,
                    data.values.len(),
                    table.columns.len()
                ),
            ));
        }
        if !seen_dates.insert(data.date) {
            return Err(SectionError::new(
                sheet.name.clone(),
                format!("duplicate date {}", data.date),
            ));
        }

        let row = ensure_row(&sheet.name, FIRST_DATA_ROW + i as u32)?;
        let date = ensure_date(&sheet.name, data.date)?;
        sheet.write(row, 0, CellValue::Date(date), CellStyle::Date);
        for (j, value) in data.values.iter().enumerate() {
            if let Some(score) = value {
                let score = ensure_finite(&sheet.name, "interest score", *score)?;
                sheet.write_number(row, 1 + j as u16, score);
            }
        }
    }

    if include_charts && table.rows.len() > 1 {
        let chart = derive_chart(period, table.columns.len(), table.rows.len());
        sheet.charts.push(chart);
    }

    Ok(())
}

/// Line chart over the written table: one series per keyword column, first five only.
pub fn derive_chart(period: Period, column_count: usize, row_count: usize) -> ChartSpec {
    let last_data_row = FIRST_DATA_ROW + row_count as u32 - 1;
    let categories = CellRange {
        first_row: FIRST_DATA_ROW,
        first_col: 0,
        last_row: last_data_row,
        last_col: 0,
    };

    let series = (0..column_count.min(MAX_SERIES))
        .map(|i| {
            let col = 1 + i as u16;
            SeriesSpec {
                name: CellRef { row: HEADER_ROW, col },
                categories,
                values: CellRange {
                    first_row: FIRST_DATA_ROW,
                    first_col: col,
                    last_row: last_data_row,
                    last_col: col,
                },
            }
        })
        .collect();

    ChartSpec {
        title: chart_title(period),
        x_axis: "Date".to_string(),
        y_axis: "Search Interest".to_string(),
        series,
        anchor: CellRef {
            row: last_data_row + 2,
            col: 0,
        },
    }
}
