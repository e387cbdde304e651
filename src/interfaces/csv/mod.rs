//! Spreadsheet import and export over CSV.

pub mod commission_reader;
pub mod commission_writer;
pub mod comparison_writer;
