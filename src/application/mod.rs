//! Application layer: one service per portal feature.
//!
//! Each service owns boxed store ports and runs a short, sequential pipeline
//! per call: validate, read or write the store, return plain data.

pub mod accounts;
pub mod comparator;
pub mod content;
pub mod ledger;
pub mod settlement;
