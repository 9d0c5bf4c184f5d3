//! GICS (Global Industry Classification Standard) sectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GICS Level 1 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GicsSector {
    /// Information Technology
    InformationTechnology,

    /// Health Care
    HealthCare,

    /// Financials
    Financials,

    /// Consumer Discretionary
    ConsumerDiscretionary,

    /// Communication Services
    CommunicationServices,

    /// Industrials
    Industrials,

    /// Consumer Staples
    ConsumerStaples,

    /// Energy
    Energy,

    /// Utilities
    Utilities,

    /// Real Estate
    RealEstate,

    /// Materials
    Materials,
}

impl GicsSector {
    /// All eleven sectors.
    pub const ALL: [Self; 11] = [
        Self::InformationTechnology,
        Self::HealthCare,
        Self::Financials,
        Self::ConsumerDiscretionary,
        Self::CommunicationServices,
        Self::Industrials,
        Self::ConsumerStaples,
        Self::Energy,
        Self::Utilities,
        Self::RealEstate,
        Self::Materials,
    ];

    /// Returns the official sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InformationTechnology => "Information Technology",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::CommunicationServices => "Communication Services",
            Self::Industrials => "Industrials",
            Self::ConsumerStaples => "Consumer Staples",
            Self::Energy => "Energy",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
            Self::Materials => "Materials",
        }
    }

    /// Classify a free-text sector label.
    ///
    /// Accepts the official names and the shorter labels data vendors
    /// publish (`Technology`, `Healthcare`, `Financial Services`, ...),
    /// ignoring case, spaces, `&` and `-`.
    pub fn from_name(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let sector = match key.as_str() {
            "informationtechnology" | "technology" | "tech" | "it" => Self::InformationTechnology,
            "healthcare" | "health" => Self::HealthCare,
            "financials" | "financial" | "financialservices" | "finance" => Self::Financials,
            "consumerdiscretionary" | "consumercyclical" | "discretionary" => Self::ConsumerDiscretionary,
            "communicationservices" | "communication" | "comms" | "telecommunications" => {
                Self::CommunicationServices
            }
            "industrials" | "industrial" => Self::Industrials,
            "consumerstaples" | "consumerdefensive" | "staples" => Self::ConsumerStaples,
            "energy" => Self::Energy,
            "utilities" | "utility" => Self::Utilities,
            "realestate" => Self::RealEstate,
            "materials" | "basicmaterials" => Self::Materials,
            _ => return None,
        };
        Some(sector)
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GicsSector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown sector {:?}", s))
    }
}
