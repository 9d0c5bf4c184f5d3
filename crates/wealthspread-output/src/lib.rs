#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/wealthspread/wealthspread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod export;
pub mod report;

pub use artifacts::{
    CORRELATION_FILE, RETURN_MAP_FILE, load_correlation_csv, load_return_map, read_correlation_csv,
    read_return_map, save_correlation_csv, save_return_map, write_correlation_csv,
    write_return_map,
};
pub use export::{CandidateExport, ExportError, ExportFormat, Exporter, SuggestionExport};
pub use report::{EsgReport, SuggestionReport};
