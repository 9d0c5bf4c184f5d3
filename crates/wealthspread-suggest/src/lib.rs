#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/wealthspread/wealthspread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod esg_blend;
pub mod portfolio;
pub mod scorer;
pub mod search;
pub mod suggestion;

pub use config::SuggestConfig;
pub use error::{ScoreError, SuggestError};
pub use esg_blend::{EsgBlend, WeightedEsg, weighted_esg};
pub use portfolio::{Holdings, Weights, normalize, weights_with_addition, with_addition};
pub use scorer::{PortfolioScore, score_portfolio};
pub use search::{MarketArtifacts, eligible_candidates, suggest_addition};
pub use suggestion::{ScoredCandidate, Suggestion};
