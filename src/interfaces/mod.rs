pub mod columns;
pub mod csv;
pub mod layout;
pub mod xlsx;
