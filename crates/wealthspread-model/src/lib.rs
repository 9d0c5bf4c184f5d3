#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/wealthspread/wealthspread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod correlation;
pub mod error;
pub mod geometric;
pub mod returns;

// Re-export main types
pub use batch::{BatchOutcome, ExcludedTicker};
pub use correlation::{CorrelationMatrix, build_correlation_matrix, pearson};
pub use error::ModelError;
pub use geometric::{GeometricReturnEstimator, ReturnMap, ReturnModelConfig, build_return_map};
pub use returns::{PercentChangeSeries, ReturnSeriesConfig, percent_changes, percent_changes_with};
