use crate::domain::commission::CommissionDraft;
use crate::error::{PortalError, Result};
use crate::interfaces::columns::ColumnMap;
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

/// Reads commission rows from the first sheet of an Excel or OpenDocument
/// workbook.
///
/// Header matching and cell parsing are the same as for CSV. Date cells
/// arrive as spreadsheet serials and percentage cells as fractions, both of
/// which the column parsers understand.
pub struct WorkbookReader {
    rows: Vec<Vec<String>>,
}

impl WorkbookReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            PortalError::ValidationError(format!("'{}' has no worksheets", path.display()))
        })??;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(Self { rows })
    }

    /// Fails up front when a required column is missing.
    pub fn drafts(self) -> Result<impl Iterator<Item = Result<CommissionDraft>>> {
        let mut rows = self.rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let columns = ColumnMap::from_headers(&headers)?;
        Ok(rows.map(move |row| columns.draft(&row)))
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::DateTime(value) => value.as_f64().to_string(),
        other => other.to_string(),
    }
}
