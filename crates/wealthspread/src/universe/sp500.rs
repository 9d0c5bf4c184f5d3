//! S&P 500 candidate universe.

use crate::universe::gics::GicsSector;
use std::collections::{BTreeMap, HashMap};
use wealthspread_data::{SecurityDirectory, Ticker};

/// Built-in fallback universe: large S&P 500 names used when no security
/// listing is available.
const FALLBACK: [(&str, GicsSector); 20] = [
    ("AAPL", GicsSector::InformationTechnology),
    ("MSFT", GicsSector::InformationTechnology),
    ("AMZN", GicsSector::ConsumerDiscretionary),
    ("GOOGL", GicsSector::CommunicationServices),
    ("META", GicsSector::CommunicationServices),
    ("TSLA", GicsSector::ConsumerDiscretionary),
    ("JPM", GicsSector::Financials),
    ("JNJ", GicsSector::HealthCare),
    ("V", GicsSector::Financials),
    ("PG", GicsSector::ConsumerStaples),
    ("NVDA", GicsSector::InformationTechnology),
    ("HD", GicsSector::ConsumerDiscretionary),
    ("MA", GicsSector::Financials),
    ("UNH", GicsSector::HealthCare),
    ("BAC", GicsSector::Financials),
    ("DIS", GicsSector::CommunicationServices),
    ("ADBE", GicsSector::InformationTechnology),
    ("CRM", GicsSector::InformationTechnology),
    ("NFLX", GicsSector::CommunicationServices),
    ("XOM", GicsSector::Energy),
];

/// A universe member and its sector, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    /// Ticker symbol.
    pub ticker: Ticker,
    /// GICS sector.
    pub sector: Option<GicsSector>,
}

impl Constituent {
    /// Create a new constituent.
    pub const fn new(ticker: Ticker, sector: Option<GicsSector>) -> Self {
        Self { ticker, sector }
    }
}

/// Ordered list of candidate securities.
///
/// The order is meaningful: candidate truncation keeps a prefix of it.
#[derive(Debug, Clone)]
pub struct Sp500Universe {
    constituents: Vec<Constituent>,
    sectors: HashMap<Ticker, Option<GicsSector>>,
}

impl Sp500Universe {
    /// Build from constituents, keeping the first occurrence of a ticker.
    pub fn new(constituents: impl IntoIterator<Item = Constituent>) -> Self {
        let mut sectors = HashMap::new();
        let constituents = constituents
            .into_iter()
            .filter(|c| {
                if sectors.contains_key(&c.ticker) {
                    return false;
                }
                sectors.insert(c.ticker.clone(), c.sector);
                true
            })
            .collect();
        Self {
            constituents,
            sectors,
        }
    }

    /// The built-in list of twenty large caps.
    pub fn fallback() -> Self {
        Self::new(FALLBACK.iter().filter_map(|&(symbol, sector)| {
            Ticker::new(symbol)
                .ok()
                .map(|ticker| Constituent::new(ticker, Some(sector)))
        }))
    }

    /// Every security in `directory`, in lexicographic ticker order, with
    /// sectors classified from the directory's sector labels.
    pub fn from_directory(directory: &SecurityDirectory) -> Self {
        Self::new(directory.iter().map(|(ticker, info)| {
            let sector = info.sector.as_deref().and_then(GicsSector::from_name);
            Constituent::new(ticker.clone(), sector)
        }))
    }

    /// Get all constituents.
    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    /// Tickers in universe order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.constituents.iter().map(|c| c.ticker.clone()).collect()
    }

    /// Sector of `ticker`, if it is a classified member.
    pub fn sector(&self, ticker: &str) -> Option<GicsSector> {
        self.sectors.get(ticker).copied().flatten()
    }

    /// Members of `sector`, in universe order.
    pub fn tickers_in_sector(&self, sector: GicsSector) -> Vec<Ticker> {
        self.constituents
            .iter()
            .filter(|c| c.sector == Some(sector))
            .map(|c| c.ticker.clone())
            .collect()
    }

    /// Number of members per sector; unclassified members are keyed `None`.
    pub fn sector_counts(&self) -> BTreeMap<Option<GicsSector>, usize> {
        let mut counts = BTreeMap::new();
        for constituent in &self.constituents {
            *counts.entry(constituent.sector).or_insert(0) += 1;
        }
        counts
    }

    /// Tickers reordered round-robin across sectors.
    ///
    /// Sectors take turns in order of first appearance, each contributing its
    /// next member in universe order, so a truncated prefix spans as many
    /// sectors as possible. Unclassified members form one more group.
    pub fn sector_interleaved(&self) -> Vec<Ticker> {
        let mut groups: Vec<(Option<GicsSector>, Vec<&Ticker>)> = Vec::new();
        for constituent in &self.constituents {
            match groups.iter_mut().find(|(s, _)| *s == constituent.sector) {
                Some((_, members)) => members.push(&constituent.ticker),
                None => groups.push((constituent.sector, vec![&constituent.ticker])),
            }
        }

        let rounds = groups.iter().map(|(_, m)| m.len()).max().unwrap_or(0);
        let mut out = Vec::with_capacity(self.constituents.len());
        for round in 0..rounds {
            out.extend(
                groups
                    .iter()
                    .filter_map(|(_, members)| members.get(round))
                    .map(|&t| t.clone()),
            );
        }
        out
    }
}

impl Default for Sp500Universe {
    fn default() -> Self {
        Self::fallback()
    }
}
