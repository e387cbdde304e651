pub mod workbook_reader;
pub mod workbook_writer;

use std::path::Path;

/// Whether the file extension names a spreadsheet workbook rather than CSV.
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"
            )
        })
}
