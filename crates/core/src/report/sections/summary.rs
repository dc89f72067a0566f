use crate::domain::bundle::{StockTrendsTable, TrendingSearchRow, TrendsBundle};
use crate::domain::period::Period;
use crate::report::document::{CellStyle, CellValue, Sheet};
use crate::report::sections::{ensure_finite, ensure_text, format_score, SectionError};
use chrono::NaiveDateTime;

pub const SHEET_NAME: &str = "Summary";

const TOP_N: usize = 5;
const FIRST_BLOCK_ROW: u32 = 3;
const BLOCK_GAP: u32 = 2;

pub const INSIGHTS: [&str; 5] = [
    "This report shows trending searches and stock market related trends from Google Trends.",
    "Daily trending searches show what people are searching for right now.",
    "Stock market trends show relative interest in trading and investment topics.",
    "Check individual sheets for more detailed data and charts.",
    "For stock market topics, look at related queries to find emerging themes.",
];

pub fn build(
    sheet: &mut Sheet,
    bundle: &TrendsBundle,
    generated_at: NaiveDateTime,
) -> Result<(), SectionError> {
    sheet.set_column_width(0, 25.0);
    sheet.set_column_width(1, 60.0);

    sheet.merge_row(0, 0, 1, "Google Trends Summary Report", CellStyle::Title);
    sheet.merge_row(
        1,
        0,
        1,
        format!("Generated on {}", generated_at.format("%Y-%m-%d at %H:%M:%S")),
        CellStyle::Subtitle,
    );

    let mut row = FIRST_BLOCK_ROW;
    // A faulty data block is cut short but never hides the blocks after it.
    let mut fault = None;

    if let Some(daily) = bundle.trending(Period::Daily).filter(|rows| !rows.is_empty()) {
        match write_top_searches(sheet, row, daily) {
            Ok(next) => row = next + BLOCK_GAP,
            Err(err) => {
                row = resume_after_fault(sheet, row);
                fault.get_or_insert(err);
            }
        }
    }

    if let Some(table) = bundle.stock(Period::Daily) {
        match write_top_stocks(sheet, row, table) {
            Ok(next) if next > row => row = next + BLOCK_GAP,
            Ok(_) => {}
            Err(err) => {
                row = resume_after_fault(sheet, row);
                fault.get_or_insert(err);
            }
        }
    }

    sheet.merge_row(row, 0, 1, "Insights and Observations", CellStyle::Header);
    row += 1;
    for insight in INSIGHTS {
        sheet.merge_row(row, 0, 1, insight, CellStyle::Wrapped);
        row += 1;
    }

    match fault {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Row for the next block after one that faulted. A block that wrote nothing takes no space.
fn resume_after_fault(sheet: &Sheet, block_start: u32) -> u32 {
    match sheet.last_row() {
        Some(last) if last >= block_start => last + 1 + BLOCK_GAP,
        _ => block_start,
    }
}

fn write_top_searches(
    sheet: &mut Sheet,
    mut row: u32,
    daily: &[TrendingSearchRow],
) -> Result<u32, SectionError> {
    sheet.merge_row(row, 0, 1, "Top 5 Daily Trending Searches", CellStyle::Header);
    row += 1;
    for search in daily.iter().take(TOP_N) {
        if search.rank == 0 {
            return Err(SectionError::new(
                SHEET_NAME,
                format!("trending search '{}' has rank 0", search.search_term),
            ));
        }
        let term = ensure_text(SHEET_NAME, "search term", &search.search_term)?;
        sheet.write(
            row,
            0,
            CellValue::Text(format!("#{}", search.rank)),
            CellStyle::Plain,
        );
        sheet.write_text(row, 1, term);
        row += 1;
    }
    Ok(row)
}

/// Returns the row after the block, or `row` itself when nothing ranks.
fn write_top_stocks(
    sheet: &mut Sheet,
    mut row: u32,
    table: &StockTrendsTable,
) -> Result<u32, SectionError> {
    let ranked = rank_latest(table)?;
    if ranked.is_empty() {
        return Ok(row);
    }
    sheet.merge_row(row, 0, 1, "Top Stock Market Trends", CellStyle::Header);
    row += 1;
    for (keyword, score) in ranked.into_iter().take(TOP_N) {
        let keyword = ensure_text(SHEET_NAME, "keyword", keyword)?;
        sheet.write_text(row, 0, keyword);
        sheet.write_text(row, 1, format!("Interest score: {}", format_score(score)));
        row += 1;
    }
    Ok(row)
}

/// Keywords at the latest date, highest score first. Equal scores keep column order.
/// Missing cells are left out.
pub fn rank_latest(table: &StockTrendsTable) -> Result<Vec<(&str, f64)>, SectionError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let Some(latest) = table.latest_row() else {
        return Ok(Vec::new());
    };
    if latest.values.len() != table.columns.len() {
        return Err(SectionError::new(
            SHEET_NAME,
            format!(
                "stock row {} has {} values for {} columns",
                latest.date,
                latest.values.len(),
                table.columns.len()
            ),
        ));
    }

    let mut ranked = Vec::with_capacity(table.columns.len());
    for (keyword, value) in table.columns.iter().zip(&latest.values) {
        if let Some(score) = value {
            ranked.push((keyword.as_str(), ensure_finite(SHEET_NAME, "interest score", *score)?));
        }
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::StockTrendsRow;
    use chrono::NaiveDate;
    use serde_json::json;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn build_sheet(bundle: &TrendsBundle) -> Sheet {
        let mut sheet = Sheet::new(SHEET_NAME);
        build(&mut sheet, bundle, generated_at()).unwrap();
        sheet
    }

    fn daily_trends(n: u32) -> serde_json::Value {
        let rows: Vec<_> = (1..=n)
            .map(|rank| {
                json!({"rank": rank, "search_term": format!("term {rank}"), "period": "daily", "date": "2026-10-19"})
            })
            .collect();
        json!({ "daily": rows })
    }

    #[test]
    fn ranks_latest_row_by_score_descending() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
        let table = StockTrendsTable {
            columns: vec!["A".into(), "B".into(), "C".into()],
            rows: vec![
                StockTrendsRow { date: d(19), values: vec![Some(10.0), Some(30.0), Some(20.0)] },
                StockTrendsRow { date: d(18), values: vec![Some(99.0), Some(0.0), Some(0.0)] },
            ],
        };
        let ranked = rank_latest(&table).unwrap();
        assert_eq!(ranked, vec![("B", 30.0), ("C", 20.0), ("A", 10.0)]);
    }

    #[test]
    fn equal_scores_keep_column_order() {
        let table = StockTrendsTable {
            columns: vec!["X".into(), "Y".into(), "Z".into()],
            rows: vec![StockTrendsRow {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                values: vec![Some(50.0), None, Some(50.0)],
            }],
        };
        let ranked = rank_latest(&table).unwrap();
        assert_eq!(ranked, vec![("X", 50.0), ("Z", 50.0)]);
    }

    #[test]
    fn writes_top_five_searches_then_stock_block() {
        let bundle: TrendsBundle = serde_json::from_value(json!({
            "trending_searches": daily_trends(8),
            "stock_trends": {"daily": {
                "columns": ["A", "B", "C"],
                "rows": [{"date": "2026-10-19", "values": [10, 30, 20]}]
            }}
        }))
        .unwrap();
        let sheet = build_sheet(&bundle);

        assert_eq!(sheet.merged_text(0), Some("Google Trends Summary Report"));
        assert_eq!(sheet.merged_text(1), Some("Generated on 2026-10-19 at 08:00:00"));
        assert_eq!(sheet.merged_text(3), Some("Top 5 Daily Trending Searches"));
        assert_eq!(sheet.text(4, 0), Some("#1"));
        assert_eq!(sheet.text(8, 1), Some("term 5"));
        assert_eq!(sheet.text(9, 0), None);

        // Rows 4..=8 hold searches, two blank rows, then the stock header.
        assert_eq!(sheet.merged_text(11), Some("Top Stock Market Trends"));
        assert_eq!(sheet.text(12, 0), Some("B"));
        assert_eq!(sheet.text(12, 1), Some("Interest score: 30"));
        assert_eq!(sheet.text(13, 0), Some("C"));
        assert_eq!(sheet.text(14, 0), Some("A"));
        assert_eq!(sheet.merged_text(17), Some("Insights and Observations"));
        assert_eq!(sheet.merged_text(18), Some(INSIGHTS[0]));
    }

    #[test]
    fn absent_blocks_shift_later_blocks_up() {
        let sheet = build_sheet(&TrendsBundle::default());
        assert_eq!(sheet.merged_text(3), Some("Insights and Observations"));
        assert_eq!(sheet.merged_text(4 + 4), Some(INSIGHTS[4]));
        assert_eq!(sheet.last_row(), Some(8));
    }

    #[test]
    fn stock_block_follows_directly_when_searches_missing() {
        let bundle: TrendsBundle = serde_json::from_value(json!({
            "trending_searches": {"daily": []},
            "stock_trends": {"daily": {
                "columns": ["Bitcoin"],
                "rows": [{"date": "2026-10-19", "values": [42.5]}]
            }}
        }))
        .unwrap();
        let sheet = build_sheet(&bundle);
        assert_eq!(sheet.merged_text(3), Some("Top Stock Market Trends"));
        assert_eq!(sheet.text(4, 1), Some("Interest score: 42.5"));
        assert_eq!(sheet.merged_text(7), Some("Insights and Observations"));
    }

    #[test]
    fn ragged_latest_row_is_a_section_fault() {
        let bundle: TrendsBundle = serde_json::from_value(json!({
            "stock_trends": {"daily": {
                "columns": ["A", "B"],
                "rows": [{"date": "2026-10-19", "values": [1]}]
            }}
        }))
        .unwrap();
        let mut sheet = Sheet::new(SHEET_NAME);
        let err = build(&mut sheet, &bundle, generated_at()).unwrap_err();
        assert!(err.detail.contains("1 values for 2 columns"));
        assert_eq!(sheet.merged_text(0), Some("Google Trends Summary Report"));
        // Insights do not depend on the data and are still written.
        assert_eq!(sheet.merged_text(3), Some("Insights and Observations"));
        assert_eq!(sheet.merged_text(8), Some(INSIGHTS[4]));
    }

    #[test]
    fn faulty_search_block_keeps_stock_and_insights() {
        let bundle: TrendsBundle = serde_json::from_value(json!({
            "trending_searches": {"daily": [
                {"rank": 1, "search_term": "fed", "period": "daily", "date": "2026-10-19"},
                {"rank": 0, "search_term": "bad", "period": "daily", "date": "2026-10-19"}
            ]},
            "stock_trends": {"daily": {
                "columns": ["Bitcoin"],
                "rows": [{"date": "2026-10-19", "values": [70]}]
            }}
        }))
        .unwrap();
        let mut sheet = Sheet::new(SHEET_NAME);
        let err = build(&mut sheet, &bundle, generated_at()).unwrap_err();
        assert!(err.detail.contains("rank 0"));

        assert_eq!(sheet.text(4, 1), Some("fed"));
        assert_eq!(sheet.text(5, 0), None);
        assert_eq!(sheet.merged_text(7), Some("Top Stock Market Trends"));
        assert_eq!(sheet.text(8, 0), Some("Bitcoin"));
        assert_eq!(sheet.merged_text(11), Some("Insights and Observations"));
    }
}
