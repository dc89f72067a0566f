use crate::report::document::{CellStyle, CellValue, ChartSpec, Document, Sheet};
use anyhow::Context;
use chrono::Datelike;
use rust_xlsxwriter::{
    Chart, ChartFormat, ChartLegendPosition, ChartLine, ChartType, Color, ExcelDateTime, Format,
    FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use std::path::Path;

struct Formats {
    plain: Format,
    title: Format,
    header: Format,
    subtitle: Format,
    wrapped: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            plain: Format::new(),
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_font_color(Color::RGB(0x0366D6))
                .set_border(FormatBorder::Thin),
            header: Format::new()
                .set_bold()
                .set_font_size(12)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_background_color(Color::RGB(0xD9D9D9))
                .set_border(FormatBorder::Thin),
            subtitle: Format::new().set_align(FormatAlign::Center).set_italic(),
            wrapped: Format::new().set_text_wrap(),
            date: Format::new()
                .set_num_format("yyyy-mm-dd")
                .set_align(FormatAlign::Center),
        }
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Plain => &self.plain,
            CellStyle::Title => &self.title,
            CellStyle::Header => &self.header,
            CellStyle::Subtitle => &self.subtitle,
            CellStyle::Wrapped => &self.wrapped,
            CellStyle::Date => &self.date,
        }
    }
}

/// Writes the document as an `.xlsx` workbook. The file is complete once this returns.
///
/// A sheet the writer rejects part-way keeps what was written before the rejected item;
/// only failing to write the file itself is an error.
pub fn save(document: &Document, path: &Path) -> anyhow::Result<()> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    for sheet in &document.sheets {
        let worksheet = workbook.add_worksheet();
        if let Err(err) = write_sheet(worksheet, sheet, &formats) {
            tracing::warn!(sheet = %sheet.name, error = %err, "sheet rejected by xlsx writer; keeping partial sheet");
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    formats: &Formats,
) -> Result<(), XlsxError> {
    worksheet.set_name(&sheet.name)?;

    for (col, width) in &sheet.column_widths {
        worksheet.set_column_width(*col, *width)?;
    }

    for merge in &sheet.merges {
        let r = merge.range;
        worksheet.merge_range(
            r.first_row,
            r.first_col,
            r.last_row,
            r.last_col,
            &merge.text,
            formats.get(merge.style),
        )?;
    }

    for (&(row, col), cell) in &sheet.cells {
        let format = formats.get(cell.style);
        match &cell.value {
            CellValue::Text(s) => {
                worksheet.write_string_with_format(row, col, s, format)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number_with_format(row, col, *n, format)?;
            }
            CellValue::Date(d) => {
                let dt = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
                worksheet.write_datetime_with_format(row, col, &dt, format)?;
            }
        }
    }

    for spec in &sheet.charts {
        let chart = line_chart(&sheet.name, spec);
        worksheet.insert_chart(spec.anchor.row, spec.anchor.col, &chart)?;
    }

    Ok(())
}

fn line_chart(sheet_name: &str, spec: &ChartSpec) -> Chart {
    let mut chart = Chart::new(ChartType::Line);
    chart.title().set_name(spec.title.as_str());
    chart
        .x_axis()
        .set_name(spec.x_axis.as_str())
        .set_position_between_ticks(false);
    chart
        .y_axis()
        .set_name(spec.y_axis.as_str())
        .set_major_gridlines(true);
    chart.legend().set_position(ChartLegendPosition::Bottom);

    for series in &spec.series {
        let c = series.categories;
        let v = series.values;
        chart
            .add_series()
            .set_name((sheet_name, series.name.row, series.name.col))
            .set_categories((sheet_name, c.first_row, c.first_col, c.last_row, c.last_col))
            .set_values((sheet_name, v.first_row, v.first_col, v.last_row, v.last_col))
            .set_format(ChartFormat::new().set_line(ChartLine::new().set_width(2.25)));
    }

    chart.set_width(720).set_height(400);
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::document::{CellRange, CellRef, SeriesSpec};
    use chrono::NaiveDate;

    #[test]
    fn saves_every_cell_kind_and_a_chart() {
        let mut sheet = Sheet::new("Stock Trends Daily");
        sheet.merge_row(0, 0, 1, "Title", CellStyle::Title);
        sheet.write_header_row(1, &["Date", "Bitcoin"]);
        for (i, day) in [1u32, 2].iter().enumerate() {
            let row = 2 + i as u32;
            sheet.write(
                row,
                0,
                CellValue::Date(NaiveDate::from_ymd_opt(2026, 10, *day).unwrap()),
                CellStyle::Date,
            );
            sheet.write_number(row, 1, 10.0 * f64::from(*day));
        }
        sheet.charts.push(ChartSpec {
            title: "chart".into(),
            x_axis: "Date".into(),
            y_axis: "Search Interest".into(),
            series: vec![SeriesSpec {
                name: CellRef { row: 1, col: 1 },
                categories: CellRange { first_row: 2, first_col: 0, last_row: 3, last_col: 0 },
                values: CellRange { first_row: 2, first_col: 1, last_row: 3, last_col: 1 },
            }],
            anchor: CellRef { row: 5, col: 0 },
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        save(&Document { sheets: vec![sheet] }, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");
        let doc = Document { sheets: vec![Sheet::new("Summary")] };
        assert!(save(&doc, &path).is_err());
    }

    #[test]
    fn cell_rejected_by_the_writer_only_degrades_its_sheet() {
        let mut bad = Sheet::new("Related Queries Daily");
        bad.write_text(0, 0, "kept");
        bad.write_text(1, 0, "q".repeat(40_000));
        let mut dated = Sheet::new("Stock Trends Weekly");
        dated.write(
            2,
            0,
            CellValue::Date(NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()),
            CellStyle::Date,
        );
        let mut good = Sheet::new("Summary");
        good.write_text(0, 0, "Google Trends Summary Report");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        save(&Document { sheets: vec![good, bad, dated] }, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
