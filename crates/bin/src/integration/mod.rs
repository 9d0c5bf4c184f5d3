//! Glue between the command line and the library crates.
//!
//! Resolves the data directory layout and moves data from the market data
//! API and the legacy JSON files into the SQLite cache.

pub(crate) mod cache_manager;
pub(crate) mod data_pipeline;
