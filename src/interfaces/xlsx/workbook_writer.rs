use crate::domain::commission::CommissionRecord;
use crate::domain::settlement::Settlement;
use crate::error::Result;
use crate::interfaces::layout::{
    Cell, RECORD_HEADERS, SETTLEMENT_MONTH_HEADER, record_cells, totals_cells,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

const AMOUNT_FORMAT: &str = "#,##0.00";
const PERCENT_FORMAT: &str = "0.##%";
const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Writes ledgers and settlement reports as `.xlsx` workbooks.
///
/// Same layout as the CSV export, but amounts, rates and dates are stored as
/// numbers so the sheet can be summed and sorted.
pub struct WorkbookWriter {
    workbook: Workbook,
    header: Format,
    styles: Styles,
}

struct Styles {
    amount: Format,
    percent: Format,
    date: Format,
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            header: Format::new().set_bold(),
            styles: Styles {
                amount: Format::new().set_num_format(AMOUNT_FORMAT),
                percent: Format::new().set_num_format(PERCENT_FORMAT),
                date: Format::new().set_num_format(DATE_FORMAT),
            },
        }
    }

    pub fn write_records(
        mut self,
        path: &Path,
        insurer: &str,
        records: &[CommissionRecord],
    ) -> Result<()> {
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(sheet_name(insurer))?;
        for (col, header) in RECORD_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &self.header)?;
        }
        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in record_cells(insurer, record).iter().enumerate() {
                write_cell(sheet, row, col as u16, cell, &self.styles)?;
            }
        }
        self.workbook.save(path)?;
        Ok(())
    }

    /// One row per settlement line, then a `TOTAL` footer.
    pub fn write_settlement(
        mut self,
        path: &Path,
        insurer: &str,
        settlement: &Settlement,
    ) -> Result<()> {
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(sheet_name(insurer))?;
        sheet.write_string_with_format(0, 0, SETTLEMENT_MONTH_HEADER, &self.header)?;
        for (col, header) in RECORD_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16 + 1, *header, &self.header)?;
        }

        let mut row = 1;
        for line in &settlement.lines {
            sheet.write_string(row, 0, line.label())?;
            for (col, cell) in record_cells(insurer, &line.record).iter().enumerate() {
                write_cell(sheet, row, col as u16 + 1, cell, &self.styles)?;
            }
            row += 1;
        }
        for (col, cell) in totals_cells(insurer, &settlement.totals).iter().enumerate() {
            write_cell(sheet, row, col as u16 + 1, cell, &self.styles)?;
        }

        self.workbook.save(path)?;
        Ok(())
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    styles: &Styles,
) -> Result<()> {
    match cell {
        Cell::Blank => {}
        Cell::Text(text) => {
            sheet.write_string(row, col, *text)?;
        }
        Cell::Date(date) => {
            sheet.write_number_with_format(row, col, serial(*date), &styles.date)?;
        }
        Cell::Amount(amount) => {
            sheet.write_number_with_format(row, col, number(*amount), &styles.amount)?;
        }
        Cell::Percent(pct) => {
            let fraction = *pct / Decimal::ONE_HUNDRED;
            sheet.write_number_with_format(row, col, number(fraction), &styles.percent)?;
        }
    }
    Ok(())
}

fn number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Days since 1899-12-30, the 1900 date system's day zero.
fn serial(date: chrono::NaiveDate) -> f64 {
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    (date - epoch).num_days() as f64
}

/// Sheet names are capped at 31 characters and cannot contain `[]:*?/\`.
fn sheet_name(insurer: &str) -> String {
    let name: String = insurer
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    let name = name.trim().trim_matches('\'').to_string();
    if name.is_empty() {
        "Comisiones".to_string()
    } else {
        name
    }
}
