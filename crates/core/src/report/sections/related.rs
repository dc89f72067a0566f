use crate::domain::bundle::{QueryRow, RelatedQueries, RelatedQueriesByKeyword};
use crate::domain::period::Period;
use crate::report::document::{CellStyle, Sheet};
use crate::report::sections::{ensure_finite, ensure_row, ensure_text, SectionError};

const WIDTHS: [f64; 3] = [25.0, 40.0, 15.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Top,
    Rising,
}

impl QueryKind {
    pub fn sheet_name(self, period: Period) -> String {
        match self {
            QueryKind::Top => format!("Related Queries {}", period.label()),
            QueryKind::Rising => format!("Rising Queries {}", period.label()),
        }
    }

    fn title(self, period: Period) -> String {
        match self {
            QueryKind::Top => format!("Related Queries - {}", period.label()),
            QueryKind::Rising => format!("Rising Related Queries - {}", period.label()),
        }
    }

    fn query_header(self) -> &'static str {
        match self {
            QueryKind::Top => "Related Query",
            QueryKind::Rising => "Rising Query",
        }
    }

    fn rows(self, queries: &RelatedQueries) -> &[QueryRow] {
        match self {
            QueryKind::Top => &queries.top,
            QueryKind::Rising => &queries.rising,
        }
    }
}

/// Flattens every keyword's top (or rising) table into one (keyword, query, value) listing.
pub fn build(
    sheet: &mut Sheet,
    period: Period,
    kind: QueryKind,
    by_keyword: &RelatedQueriesByKeyword,
) -> Result<(), SectionError> {
    for (col, width) in WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width);
    }
    sheet.merge_row(0, 0, 2, kind.title(period), CellStyle::Title);
    sheet.write_header_row(1, &["Keyword", kind.query_header(), "Value"]);

    let mut row = 2;
    for (keyword, queries) in by_keyword.iter() {
        let keyword = ensure_text(&sheet.name, "keyword", keyword)?;
        for query in kind.rows(queries) {
            ensure_row(&sheet.name, row)?;
            let text = ensure_text(&sheet.name, "query", &query.query)?;
            let value = ensure_finite(&sheet.name, "query value", query.value)?;
            sheet.write_text(row, 0, keyword);
            sheet.write_text(row, 1, text);
            sheet.write_number(row, 2, value);
            row += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::document::CellValue;

    fn q(query: &str, value: f64) -> QueryRow {
        QueryRow {
            query: query.to_string(),
            value,
        }
    }

    fn sample() -> RelatedQueriesByKeyword {
        let mut by_keyword = RelatedQueriesByKeyword::default();
        by_keyword.push(
            "Bitcoin",
            RelatedQueries {
                top: vec![q("bitcoin price", 100.0), q("btc", 64.0), q("bitcoin etf", 31.0)],
                rising: vec![q("bitcoin halving", 4250.0)],
            },
        );
        by_keyword.push("Ethereum", RelatedQueries::default());
        by_keyword
    }

    #[test]
    fn top_rows_come_only_from_keywords_with_data() {
        let mut sheet = Sheet::new(QueryKind::Top.sheet_name(Period::Daily));
        build(&mut sheet, Period::Daily, QueryKind::Top, &sample()).unwrap();

        assert_eq!(sheet.name, "Related Queries Daily");
        assert_eq!(sheet.merged_text(0), Some("Related Queries - Daily"));
        assert_eq!(sheet.text(1, 1), Some("Related Query"));
        for row in 2..=4 {
            assert_eq!(sheet.text(row, 0), Some("Bitcoin"));
        }
        assert_eq!(sheet.text(3, 1), Some("btc"));
        assert_eq!(sheet.cell(4, 2), Some(&CellValue::Number(31.0)));
        assert_eq!(sheet.last_row(), Some(4));
    }

    #[test]
    fn rising_sheet_uses_its_own_headers() {
        let mut sheet = Sheet::new(QueryKind::Rising.sheet_name(Period::Weekly));
        build(&mut sheet, Period::Weekly, QueryKind::Rising, &sample()).unwrap();

        assert_eq!(sheet.name, "Rising Queries Weekly");
        assert_eq!(sheet.merged_text(0), Some("Rising Related Queries - Weekly"));
        assert_eq!(sheet.text(1, 1), Some("Rising Query"));
        assert_eq!(sheet.text(2, 1), Some("bitcoin halving"));
        assert_eq!(sheet.last_row(), Some(2));
    }

    #[test]
    fn headers_are_written_without_any_keywords() {
        let mut sheet = Sheet::new(QueryKind::Top.sheet_name(Period::Monthly));
        build(
            &mut sheet,
            Period::Monthly,
            QueryKind::Top,
            &RelatedQueriesByKeyword::default(),
        )
        .unwrap();
        assert_eq!(sheet.text(1, 0), Some("Keyword"));
        assert_eq!(sheet.text(1, 2), Some("Value"));
        assert_eq!(sheet.last_row(), Some(1));
    }

    #[test]
    fn query_longer_than_a_cell_is_a_section_fault() {
        let mut by_keyword = sample();
        by_keyword.0[0].1.top[1].query = "b".repeat(40_000);
        let mut sheet = Sheet::new(QueryKind::Top.sheet_name(Period::Daily));
        let err = build(&mut sheet, Period::Daily, QueryKind::Top, &by_keyword).unwrap_err();
        assert!(err.detail.contains("40000 characters"));
        assert_eq!(sheet.text(2, 1), Some("bitcoin price"));
        assert_eq!(sheet.last_row(), Some(2));
    }
}
