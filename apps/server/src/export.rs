//! # Spreadsheet Export
//!
//! Renders report rows into a styled `.xlsx` workbook.
//!
//! ## Sheet Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ row 0   LAPORAN PENJUALAN - Toko Niaga      (merged, bold)   │
//! │ row 1   Periode: 01-05-2024 s/d 31-05-2024  (merged)         │
//! │ row 2                                                        │
//! │ row 3   No │ Nomor │ Tanggal │ … │ Total     (header style)  │
//! │ row 4…  data rows, thin borders, "Rp" #,##0 for money        │
//! │ last    TOTAL                  │ … │ Σ        (bold)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use niaga_core::Money;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use tracing::info;

use crate::error::ApiResult;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const RUPIAH_FORMAT: &str = "\"Rp\" #,##0";

const FIRST_DATA_ROW: u32 = 4;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(i64),
    Money(Money),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Cell::Text(v.to_string()),
            None => Cell::Empty,
        }
    }

    fn amount(&self) -> Option<i64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Money(m) => Some(m.rupiah()),
            _ => None,
        }
    }
}

/// Column definition.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub width: f64,
    /// Summed into the totals row.
    pub total: bool,
}

impl Column {
    pub const fn new(header: &'static str, width: f64) -> Self {
        Column {
            header,
            width,
            total: false,
        }
    }

    pub const fn summed(header: &'static str, width: f64) -> Self {
        Column {
            header,
            width,
            total: true,
        }
    }
}

/// A report ready to be written.
#[derive(Debug, Clone)]
pub struct Report {
    /// Used in the file name: `laporan-<name>-…`.
    pub name: &'static str,
    pub title: String,
    pub subtitle: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    /// Write the TOTAL row.
    pub show_totals: bool,
}

impl Report {
    pub fn new(name: &'static str, title: String, subtitle: String, columns: Vec<Column>) -> Self {
        Report {
            name,
            title,
            subtitle,
            columns,
            rows: Vec::new(),
            show_totals: true,
        }
    }

    /// Drops the TOTAL row, for statements whose lines do not add up.
    pub fn without_totals(mut self) -> Self {
        self.show_totals = false;
        self
    }

    /// Appends a data row. The row number column is added by the writer.
    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// `laporan-penjualan-2024-05-01-2024-05-31.xlsx`
    pub fn filename(&self, dari: NaiveDate, sampai: NaiveDate) -> String {
        format!(
            "laporan-{}-{}-{}.xlsx",
            self.name,
            dari.format("%Y-%m-%d"),
            sampai.format("%Y-%m-%d")
        )
    }

    /// Sum of each summed column, `None` elsewhere.
    pub fn totals(&self) -> Vec<Option<i64>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                col.total.then(|| {
                    self.rows
                        .iter()
                        .filter_map(|row| row.get(idx).and_then(Cell::amount))
                        .sum()
                })
            })
            .collect()
    }

    fn is_money_column(&self, idx: usize) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row.get(idx), Some(Cell::Money(_))))
    }

    /// Renders the workbook.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Laporan")?;

        let title_format = Format::new()
            .set_bold()
            .set_font_size(14)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let subtitle_format = Format::new().set_italic().set_align(FormatAlign::Center);
        let header_format = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(Color::RGB(0xD9E1F2))
            .set_border(FormatBorder::Thin);
        let text_format = Format::new().set_border(FormatBorder::Thin);
        let number_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_num_format("#,##0");
        let money_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_num_format(RUPIAH_FORMAT);
        let total_label_format = Format::new().set_bold().set_border(FormatBorder::Thin);
        let total_money_format = Format::new()
            .set_bold()
            .set_border(FormatBorder::Thin)
            .set_num_format(RUPIAH_FORMAT);
        let total_number_format = Format::new()
            .set_bold()
            .set_border(FormatBorder::Thin)
            .set_num_format("#,##0");

        // Column 0 is the row number.
        let last_col = self.columns.len() as u16;

        sheet.merge_range(0, 0, 0, last_col, &self.title, &title_format)?;
        sheet.set_row_height(0, 22.0)?;
        sheet.merge_range(1, 0, 1, last_col, &self.subtitle, &subtitle_format)?;

        let header_row = FIRST_DATA_ROW - 1;
        sheet.write_string_with_format(header_row, 0, "No", &header_format)?;
        sheet.set_column_width(0, 5.0)?;
        for (idx, col) in self.columns.iter().enumerate() {
            let c = idx as u16 + 1;
            sheet.write_string_with_format(header_row, c, col.header, &header_format)?;
            sheet.set_column_width(c, col.width)?;
        }
        sheet.set_freeze_panes(FIRST_DATA_ROW, 0)?;

        let mut row = FIRST_DATA_ROW;
        for (n, cells) in self.rows.iter().enumerate() {
            sheet.write_number_with_format(row, 0, (n + 1) as f64, &number_format)?;
            for (idx, cell) in cells.iter().enumerate() {
                let c = idx as u16 + 1;
                match cell {
                    Cell::Text(s) => sheet.write_string_with_format(row, c, s, &text_format)?,
                    Cell::Number(v) => {
                        sheet.write_number_with_format(row, c, *v as f64, &number_format)?
                    }
                    Cell::Money(m) => {
                        sheet.write_number_with_format(row, c, m.rupiah() as f64, &money_format)?
                    }
                    Cell::Date(d) => sheet.write_string_with_format(
                        row,
                        c,
                        d.format("%d-%m-%Y").to_string(),
                        &text_format,
                    )?,
                    Cell::Empty => sheet.write_blank(row, c, &text_format)?,
                };
            }
            row += 1;
        }

        if !self.show_totals {
            return workbook.save_to_buffer();
        }

        sheet.write_string_with_format(row, 0, "", &total_label_format)?;
        sheet.write_string_with_format(row, 1, "TOTAL", &total_label_format)?;
        for (idx, total) in self.totals().into_iter().enumerate() {
            let c = idx as u16 + 1;
            match total {
                Some(sum) => {
                    let format = if self.is_money_column(idx) {
                        &total_money_format
                    } else {
                        &total_number_format
                    };
                    sheet.write_number_with_format(row, c, sum as f64, format)?;
                }
                None if idx > 0 => {
                    sheet.write_blank(row, c, &total_label_format)?;
                }
                None => {}
            }
        }

        workbook.save_to_buffer()
    }
}

/// Builds the download response for a report.
pub fn xlsx_response(report: &Report, dari: NaiveDate, sampai: NaiveDate) -> ApiResult<Response> {
    let bytes = report.to_xlsx()?;
    let filename = report.filename(dari, sampai);

    info!(report = report.name, rows = report.rows.len(), file = %filename, "Report exported");

    Ok((
        [
            (CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        let mut report = Report::new(
            "penjualan",
            "LAPORAN PENJUALAN".to_string(),
            "Periode: 01-05-2024 s/d 31-05-2024".to_string(),
            vec![
                Column::new("Nomor", 22.0),
                Column::summed("Qty", 8.0),
                Column::summed("Total", 16.0),
            ],
        );
        report.push(vec![
            Cell::text("PJ-20240501-0001"),
            Cell::Number(24),
            Cell::Money(Money::from_rupiah(120_000)),
        ]);
        report.push(vec![
            Cell::text("PJ-20240501-0002"),
            Cell::Number(6),
            Cell::Money(Money::from_rupiah(30_000)),
        ]);
        report
    }

    #[test]
    fn test_totals_only_for_summed_columns() {
        assert_eq!(sample().totals(), vec![None, Some(30), Some(150_000)]);
    }

    #[test]
    fn test_filename() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        assert_eq!(
            sample().filename(d(1), d(31)),
            "laporan-penjualan-2024-05-01-2024-05-31.xlsx"
        );
    }

    #[test]
    fn test_workbook_is_zip() {
        let bytes = sample().to_xlsx().unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_empty_report_still_renders() {
        let mut report = sample();
        report.rows.clear();
        assert_eq!(report.totals(), vec![None, Some(0), Some(0)]);
        assert!(report.to_xlsx().is_ok());
    }
}
