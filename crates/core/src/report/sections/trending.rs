use crate::domain::bundle::TrendingSearchRow;
use crate::domain::period::Period;
use crate::report::document::{CellStyle, Sheet};
use crate::report::sections::{ensure_row, ensure_text, SectionError};

const HEADERS: [&str; 4] = ["Rank", "Search Term", "Period", "Date"];
const WIDTHS: [f64; 4] = [10.0, 50.0, 15.0, 15.0];

pub fn sheet_name(period: Period) -> String {
    format!("{} Trends", period.label())
}

pub fn build(
    sheet: &mut Sheet,
    period: Period,
    rows: &[TrendingSearchRow],
) -> Result<(), SectionError> {
    for (col, width) in WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width);
    }
    sheet.merge_row(
        0,
        0,
        (HEADERS.len() - 1) as u16,
        format!("{} Trending Searches", period.label()),
        CellStyle::Title,
    );
    sheet.write_header_row(1, &HEADERS);

    for (i, search) in rows.iter().enumerate() {
        if search.rank == 0 {
            return Err(SectionError::new(
                sheet.name.clone(),
                format!("row {} ('{}') has rank 0", i + 1, search.search_term),
            ));
        }
        let row = ensure_row(&sheet.name, 2 + i as u32)?;
        let term = ensure_text(&sheet.name, "search term", &search.search_term)?;
        let period_text = ensure_text(&sheet.name, "period", &search.period)?;
        let date = ensure_text(&sheet.name, "date", &search.date)?;
        sheet.write_number(row, 0, f64::from(search.rank));
        sheet.write_text(row, 1, term);
        sheet.write_text(row, 2, period_text);
        sheet.write_text(row, 3, date);
    }

    Ok(())
}
