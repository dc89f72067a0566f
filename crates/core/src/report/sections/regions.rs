use crate::domain::bundle::KeywordRegions;
use crate::report::document::{CellStyle, Sheet};
use crate::report::sections::{ensure_finite, ensure_row, ensure_text, SectionError};

pub const SHEET_NAME: &str = "Keyword Regions";

const HEADERS: [&str; 3] = ["Keyword", "Top Regions", "Peak Interest"];
const WIDTHS: [f64; 3] = [25.0, 60.0, 15.0];
const REGIONS_LISTED: usize = 5;

/// One row per keyword: its leading regions and the peak interest over the analysis window.
pub fn build(sheet: &mut Sheet, entries: &[KeywordRegions]) -> Result<(), SectionError> {
    for (col, width) in WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width);
    }
    sheet.merge_row(
        0,
        0,
        (HEADERS.len() - 1) as u16,
        "Keyword Regional Interest",
        CellStyle::Title,
    );
    sheet.write_header_row(1, &HEADERS);

    for (i, entry) in entries.iter().enumerate() {
        let row = ensure_row(&sheet.name, 2 + i as u32)?;
        let keyword = ensure_text(&sheet.name, "keyword", &entry.keyword)?;
        let regions = entry
            .top_regions
            .iter()
            .take(REGIONS_LISTED)
            .map(|r| r.region.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ensure_text(&sheet.name, "region list", &regions)?;
        let peak = entry
            .peak_interest
            .map(|n| ensure_finite(&sheet.name, "peak interest", n))
            .transpose()?;

        sheet.write_text(row, 0, keyword);
        sheet.write_text(row, 1, regions);
        if let Some(peak) = peak {
            sheet.write_number(row, 2, peak);
        }
    }

    Ok(())
}
