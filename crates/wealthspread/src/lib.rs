#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/wealthspread/wealthspread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod market;
pub mod universe;

// Re-export main types from sub-crates
pub use wealthspread_data as data;
pub use wealthspread_model as model;
pub use wealthspread_output as output;
pub use wealthspread_suggest as suggest;

pub use market::{MarketError, MarketModel, Refresh};
pub use universe::{Universe, gics::GicsSector, sp500::Sp500Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
