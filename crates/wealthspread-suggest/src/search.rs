//! Candidate search.
//!
//! Candidates are the universe in the caller's order, minus current
//! holdings and tickers the correlation matrix does not know, with repeats
//! dropped. The list is then cut to a prefix whose length depends on the
//! portfolio size. Every candidate is scored as an addition of the full
//! investment amount; candidates that fail to score are skipped.
//!
//! Ranking is a stable sort by descending absolute score, so among equal
//! scores the earlier candidate wins. Results are gathered back in
//! candidate order before ranking, which keeps parallel and sequential runs
//! identical.

use crate::config::SuggestConfig;
use crate::esg_blend::EsgBlend;
use crate::portfolio::{Holdings, validate, weights_with_addition};
use crate::scorer::score_portfolio;
use crate::suggestion::{ScoredCandidate, Suggestion};
use crate::SuggestError;
use rayon::prelude::*;
use std::collections::HashSet;
use wealthspread_data::{EsgScores, Ticker};
use wealthspread_model::{CorrelationMatrix, ReturnMap};

/// Artifacts of the last data refresh, shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct MarketArtifacts<'a> {
    /// Pairwise correlations
    pub correlations: &'a CorrelationMatrix,
    /// Capped annualised returns
    pub returns: &'a ReturnMap,
    /// ESG risk per ticker
    pub esg: &'a EsgScores,
}

/// Eligible candidates in universe order, truncated to `limit`.
pub fn eligible_candidates<'u>(
    holdings: &Holdings,
    correlations: &CorrelationMatrix,
    universe: &'u [Ticker],
    limit: Option<usize>,
) -> Vec<&'u Ticker> {
    let mut seen = HashSet::new();
    universe
        .iter()
        .filter(|t| !holdings.contains_key(*t) && correlations.contains(t.as_str()))
        .filter(|t| seen.insert(*t))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Find the best ticker to add to `holdings` with `amount` of new money.
///
/// # Errors
/// [`SuggestError::InvalidInput`] for unusable holdings or amount, and
/// [`SuggestError::NoEligibleCandidate`] when no candidate scores.
pub fn suggest_addition(
    holdings: &Holdings,
    amount: f64,
    artifacts: &MarketArtifacts<'_>,
    universe: &[Ticker],
    config: &SuggestConfig,
) -> Result<Suggestion, SuggestError> {
    validate(holdings, amount)?;

    let candidates = eligible_candidates(
        holdings,
        artifacts.correlations,
        universe,
        config.limit_for(holdings.len()),
    );

    let evaluate = |candidate: &&Ticker| {
        let weights = weights_with_addition(holdings, candidate, amount);
        match score_portfolio(artifacts.correlations, artifacts.returns, &weights) {
            Ok(score) => Some(ScoredCandidate::new((*candidate).clone(), score)),
            Err(error) => {
                tracing::debug!(ticker = %candidate, %error, "skipping candidate");
                None
            }
        }
    };
    let results: Vec<Option<ScoredCandidate>> = if config.parallel {
        candidates.par_iter().map(evaluate).collect()
    } else {
        candidates.iter().map(evaluate).collect()
    };

    let mut ranked: Vec<ScoredCandidate> = results.into_iter().flatten().collect();
    ranked.sort_by(|a, b| b.score.abs().total_cmp(&a.score.abs()));

    let evaluated = candidates.len();
    let scored = ranked.len();
    let Some(best) = ranked.first().cloned() else {
        tracing::info!(evaluated, "no candidate could be scored");
        return Err(SuggestError::NoEligibleCandidate { evaluated });
    };

    ranked.truncate(config.alternatives);
    let esg = EsgBlend::compute(holdings, &best.ticker, amount, artifacts.esg);

    tracing::info!(
        ticker = %best.ticker,
        score = best.score,
        evaluated,
        scored,
        "suggested addition"
    );

    Ok(Suggestion {
        holdings: holdings.clone(),
        investment_amount: amount,
        best,
        alternatives: ranked,
        esg,
        evaluated,
        scored,
    })
}
