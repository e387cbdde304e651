use crate::domain::commission::CommissionDraft;
use crate::error::Result;
use crate::interfaces::columns::ColumnMap;
use std::io::Read;

/// Reads commission rows from a spreadsheet exported as CSV.
///
/// Columns are located by header name, so column order and extra columns do
/// not matter. Each row becomes a [`CommissionDraft`]; rows that cannot be
/// parsed surface as errors without stopping the stream.
pub struct CommissionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommissionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Fails up front when a required column is missing.
    pub fn drafts(mut self) -> Result<impl Iterator<Item = Result<CommissionDraft>>> {
        let headers: Vec<String> = self.reader.headers()?.iter().map(str::to_string).collect();
        let columns = ColumnMap::from_headers(&headers)?;
        Ok(self.reader.into_records().map(move |result| {
            let record = result?;
            let cells: Vec<&str> = record.iter().collect();
            columns.draft(&cells)
        }))
    }
}
