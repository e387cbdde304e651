//! Adapters for the domain ports: storage backends, the completion API, web
//! page fetching and PDF handling.

pub mod anthropic;
pub mod in_memory;
pub mod pdf;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod web;
