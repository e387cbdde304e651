//! Domain types of the brokerage back office.

pub mod commission;
pub mod content;
pub mod insurer;
pub mod money;
pub mod policy;
pub mod ports;
pub mod settlement;
pub mod user;
