pub mod document;
pub mod sections;
pub mod xlsx;

use crate::domain::bundle::TrendsBundle;
use crate::domain::period::Period;
use anyhow::Context;
use chrono::NaiveDateTime;
use document::{Document, Sheet};
use sections::related::QueryKind;
use sections::{regions, related, stock, summary, trending, SectionError};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    pub include_charts: bool,
}

impl ReportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            include_charts: true,
        }
    }
}

pub fn report_file_name(generated_at: NaiveDateTime) -> String {
    format!(
        "google_trends_report_{}.xlsx",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Builds the report and writes it under `options.output_dir`.
///
/// Malformed or missing bundle slices only degrade their own sheet; the call fails only
/// when the workbook cannot be written.
pub fn assemble(
    bundle: &TrendsBundle,
    options: &ReportOptions,
    generated_at: NaiveDateTime,
) -> anyhow::Result<PathBuf> {
    tracing::info!(output_dir = %options.output_dir.display(), "creating spreadsheet report");

    let document = build_document(bundle, generated_at, options.include_charts);

    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            options.output_dir.display()
        )
    })?;
    let path = options.output_dir.join(report_file_name(generated_at));
    xlsx::save(&document, &path)?;

    tracing::info!(
        path = %path.display(),
        sheets = document.sheets.len(),
        "spreadsheet report created"
    );
    Ok(path)
}

pub fn build_document(
    bundle: &TrendsBundle,
    generated_at: NaiveDateTime,
    include_charts: bool,
) -> Document {
    let mut sheets = Vec::new();

    sheets.push(build_sheet(summary::SHEET_NAME.to_string(), |sheet| {
        summary::build(sheet, bundle, generated_at)
    }));

    for period in Period::ALL {
        if let Some(rows) = bundle.trending(period).filter(|rows| !rows.is_empty()) {
            sheets.push(build_sheet(trending::sheet_name(period), |sheet| {
                trending::build(sheet, period, rows)
            }));
        }
    }

    for period in Period::ALL {
        if let Some(table) = bundle.stock(period).filter(|t| !t.is_empty()) {
            sheets.push(build_sheet(stock::sheet_name(period), |sheet| {
                stock::build(sheet, period, table, include_charts)
            }));
        }
    }

    if let Some(related_queries) = &bundle.related_queries {
        for (period, by_keyword) in related_queries {
            for kind in [QueryKind::Top, QueryKind::Rising] {
                sheets.push(build_sheet(kind.sheet_name(*period), |sheet| {
                    related::build(sheet, *period, kind, by_keyword)
                }));
            }
        }
    }

    if let Some(entries) = bundle.keyword_regions.as_deref().filter(|e| !e.is_empty()) {
        sheets.push(build_sheet(regions::SHEET_NAME.to_string(), |sheet| {
            regions::build(sheet, entries)
        }));
    }

    Document { sheets }
}

/// Runs one section builder. A fault keeps whatever the builder laid out before it.
fn build_sheet(
    name: String,
    builder: impl FnOnce(&mut Sheet) -> Result<(), SectionError>,
) -> Sheet {
    let mut sheet = Sheet::new(name);
    if let Err(err) = builder(&mut sheet) {
        tracing::warn!(sheet = %sheet.name, error = %err, "section build failed; keeping partial sheet");
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::StockTrendsTable;
    use chrono::NaiveDate;
    use serde_json::json;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    fn trending(period: &str, n: u32) -> serde_json::Value {
        let rows: Vec<_> = (1..=n)
            .map(|rank| json!({"rank": rank, "search_term": format!("{period} {rank}"), "period": period, "date": "2026-10-19"}))
            .collect();
        json!(rows)
    }

    fn full_bundle() -> TrendsBundle {
        serde_json::from_value(json!({
            "trending_searches": {
                "daily": trending("daily", 6),
                "weekly": trending("weekly", 3),
                "monthly": trending("monthly", 2)
            },
            "stock_trends": {
                "daily": {
                    "columns": ["Bitcoin", "Ethereum"],
                    "rows": [
                        {"date": "2026-10-18", "values": [40, 20]},
                        {"date": "2026-10-19", "values": [55, 60]}
                    ]
                },
                "weekly": {"columns": [], "rows": []}
            },
            "related_queries": {
                "daily": {
                    "Bitcoin": {"top": [{"query": "btc price", "value": 100}], "rising": []},
                    "Ethereum": {"top": [], "rising": [{"query": "eth etf", "value": 900}]}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn lays_out_sheets_in_section_order() {
        let doc = build_document(&full_bundle(), generated_at(), true);
        assert_eq!(
            doc.sheet_names(),
            vec![
                "Summary",
                "Daily Trends",
                "Weekly Trends",
                "Monthly Trends",
                "Stock Trends Daily",
                "Related Queries Daily",
                "Rising Queries Daily",
            ]
        );
        assert_eq!(doc.sheet("Stock Trends Daily").unwrap().charts.len(), 1);
    }

    #[test]
    fn missing_weekly_trending_only_drops_that_sheet() {
        let full = build_document(&full_bundle(), generated_at(), true);

        let mut bundle = full_bundle();
        if let Some(m) = bundle.trending_searches.as_mut() {
            m.remove(&Period::Weekly);
        }
        let doc = build_document(&bundle, generated_at(), true);

        assert!(doc.sheet("Weekly Trends").is_none());
        assert_eq!(doc.sheet("Daily Trends"), full.sheet("Daily Trends"));
        assert_eq!(doc.sheet("Monthly Trends"), full.sheet("Monthly Trends"));
    }

    #[test]
    fn empty_bundle_still_produces_a_summary() {
        let doc = build_document(&TrendsBundle::default(), generated_at(), true);
        assert_eq!(doc.sheet_names(), vec!["Summary"]);
        let summary = doc.sheet("Summary").unwrap();
        assert_eq!(summary.merged_text(3), Some("Insights and Observations"));
    }

    #[test]
    fn layout_is_deterministic_apart_from_timestamp() {
        let later = generated_at() + chrono::Duration::hours(3);
        let mut a = build_document(&full_bundle(), generated_at(), true);
        let mut b = build_document(&full_bundle(), later, true);
        // Row 1 of the summary carries the generation timestamp.
        for doc in [&mut a, &mut b] {
            doc.sheets[0].merges.retain(|m| m.range.first_row != 1);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn faulty_section_does_not_affect_the_others() {
        let mut bundle = full_bundle();
        if let Some(m) = bundle.trending_searches.as_mut() {
            if let Some(rows) = m.get_mut(&Period::Monthly) {
                rows[1].rank = 0;
            }
        }
        let doc = build_document(&bundle, generated_at(), true);

        let monthly = doc.sheet("Monthly Trends").unwrap();
        assert_eq!(monthly.text(2, 1), Some("monthly 1"));
        assert_eq!(monthly.last_row(), Some(2));
        assert_eq!(doc.sheets.len(), 7);
        assert_eq!(doc.sheet("Weekly Trends").unwrap().last_row(), Some(4));
    }

    #[test]
    fn related_periods_emit_header_only_sheets_when_empty() {
        let bundle: TrendsBundle = serde_json::from_value(json!({
            "related_queries": {"weekly": {}}
        }))
        .unwrap();
        let doc = build_document(&bundle, generated_at(), true);
        assert_eq!(
            doc.sheet_names(),
            vec!["Summary", "Related Queries Weekly", "Rising Queries Weekly"]
        );
        assert_eq!(doc.sheet("Rising Queries Weekly").unwrap().last_row(), Some(1));
    }

    #[test]
    fn keyword_regions_sheet_comes_last() {
        let mut bundle = full_bundle();
        bundle.keyword_regions = Some(
            serde_json::from_value(json!([
                {"keyword": "Bitcoin", "top_regions": [{"region": "El Salvador", "value": 100}], "peak_interest": 91}
            ]))
            .unwrap(),
        );
        let doc = build_document(&bundle, generated_at(), true);
        assert_eq!(doc.sheet_names().last(), Some(&"Keyword Regions"));
        assert_eq!(doc.sheet("Keyword Regions").unwrap().text(2, 1), Some("El Salvador"));

        bundle.keyword_regions = Some(Vec::new());
        let doc = build_document(&bundle, generated_at(), true);
        assert!(doc.sheet("Keyword Regions").is_none());
    }

    #[test]
    fn assemble_writes_timestamped_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions::new(dir.path().join("out"));
        let path = assemble(&full_bundle(), &options, generated_at()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "google_trends_report_20261019_093005.xlsx"
        );
        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn assemble_empty_bundle_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions::new(dir.path());
        let path = assemble(&TrendsBundle::default(), &options, generated_at()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn oversized_query_and_pre_1900_date_only_degrade_their_sheets() {
        let mut bundle = full_bundle();
        if let Some(m) = bundle.related_queries.as_mut() {
            if let Some(daily) = m.get_mut(&Period::Daily) {
                daily.0[0].1.top[0].query = "q".repeat(40_000);
            }
        }
        let weekly: StockTrendsTable = serde_json::from_value(json!({
            "columns": ["Bitcoin"],
            "rows": [
                {"date": "2026-10-12", "values": [30]},
                {"date": "1899-12-30", "values": [10]}
            ]
        }))
        .unwrap();
        if let Some(m) = bundle.stock_trends.as_mut() {
            m.insert(Period::Weekly, weekly);
        }

        let doc = build_document(&bundle, generated_at(), true);
        let related = doc.sheet("Related Queries Daily").unwrap();
        assert_eq!(related.last_row(), Some(1));
        let stock = doc.sheet("Stock Trends Weekly").unwrap();
        assert_eq!(stock.last_row(), Some(2));
        assert_eq!(doc.sheet("Rising Queries Daily").unwrap().text(2, 1), Some("eth etf"));

        let dir = tempfile::tempdir().unwrap();
        let path = assemble(&bundle, &ReportOptions::new(dir.path()), generated_at()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn assemble_fails_when_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();
        let options = ReportOptions::new(&blocker);
        assert!(assemble(&full_bundle(), &options, generated_at()).is_err());
    }
}
