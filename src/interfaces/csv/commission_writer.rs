use crate::domain::commission::CommissionRecord;
use crate::domain::settlement::Settlement;
use crate::error::Result;
use crate::interfaces::layout::{
    RECORD_HEADERS, SETTLEMENT_MONTH_HEADER, record_cells, totals_cells,
};
use std::io::Write;

/// Writes ledgers and settlement reports as spreadsheet-ready CSV with
/// Spanish column headers.
pub struct CommissionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CommissionWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_records(&mut self, insurer: &str, records: &[CommissionRecord]) -> Result<()> {
        self.writer.write_record(RECORD_HEADERS)?;
        for record in records {
            self.writer.write_record(
                record_cells(insurer, record).iter().map(ToString::to_string),
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// One row per settlement line, then a `TOTAL` footer.
    pub fn write_settlement(&mut self, insurer: &str, settlement: &Settlement) -> Result<()> {
        self.writer.write_record(
            std::iter::once(SETTLEMENT_MONTH_HEADER).chain(RECORD_HEADERS.iter().copied()),
        )?;
        for line in &settlement.lines {
            let cells = record_cells(insurer, &line.record);
            self.writer.write_record(
                std::iter::once(line.label()).chain(cells.iter().map(ToString::to_string)),
            )?;
        }

        let footer = totals_cells(insurer, &settlement.totals);
        self.writer.write_record(
            std::iter::once(String::new()).chain(footer.iter().map(ToString::to_string)),
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
