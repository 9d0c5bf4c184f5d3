//! Human-readable reports.

use crate::export::SuggestionExport;
use serde::{Deserialize, Serialize};
use std::fmt;
use wealthspread_data::{EsgEntry, EsgRiskLevel, EsgScore, EsgScores, SecurityDirectory, Ticker};
use wealthspread_suggest::Suggestion;

/// Report of a suggestion, rendered as an ASCII table or Markdown.
#[derive(Debug, Clone)]
pub struct SuggestionReport {
    export: SuggestionExport,
    holdings: Vec<(String, f64)>,
}

impl SuggestionReport {
    /// Build the report of `suggestion`.
    pub fn new(suggestion: &Suggestion, directory: &SecurityDirectory) -> Self {
        Self {
            export: SuggestionExport::new(suggestion, directory),
            holdings: suggestion
                .holdings
                .iter()
                .map(|(t, amount)| (t.to_string(), *amount))
                .collect(),
        }
    }

    /// The decorated data behind the report.
    pub const fn export(&self) -> &SuggestionExport {
        &self.export
    }

    /// Format as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let e = &self.export;
        let best = &e.suggestion;
        let mut output = String::new();

        output.push_str(&format!(
            "\nSuggested addition: {} ({})\n",
            best.ticker, best.company_name
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nCurrent Holdings:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        for (ticker, amount) in &self.holdings {
            output.push_str(&format!("  {:<10} {:>14.2}\n", ticker, amount));
        }
        output.push_str(&format!(
            "  {:<10} {:>14.2}\n",
            format!("+{}", best.ticker),
            e.investment_amount
        ));

        output.push_str("\nPortfolio With Addition:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Sharpe-like Score:        {:.3}\n",
            best.sharpe_ratio
        ));
        output.push_str(&format!(
            "  Weighted Correlation:     {:.3}\n",
            best.correlation
        ));
        output.push_str(&format!(
            "  Expected Return:          {:.2}%\n",
            best.expected_return * 100.0
        ));
        if let Some(price) = &best.current_price {
            output.push_str(&format!("  Current Price:            {}\n", price));
        }
        if let Some(cap) = &best.market_cap {
            output.push_str(&format!("  Market Cap:               {}\n", cap));
        }

        output.push_str("\nESG Risk:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Current Portfolio:        {:.2}\n",
            e.esg.before
        ));
        output.push_str(&format!("  New Portfolio:            {:.2}\n", e.esg.after));
        output.push_str(&format!("  Change:                   {:+.2}\n", e.esg.delta));
        if !e.esg.missing.is_empty() {
            output.push_str(&format!(
                "  No ESG data (counted as 0): {}\n",
                join(&e.esg.missing)
            ));
        }

        if !e.alternatives.is_empty() {
            output.push_str("\nTop Candidates:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!(
                "{:<5} {:<8} {:<30} {:>10} {:>12} {:>10}\n",
                "Rank", "Ticker", "Company", "Score", "Correlation", "Return"
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for c in &e.alternatives {
                output.push_str(&format!(
                    "{:<5} {:<8} {:<30} {:>10.3} {:>12.3} {:>9.2}%\n",
                    c.rank,
                    c.ticker,
                    truncate(&c.company_name, 30),
                    c.sharpe_ratio,
                    c.correlation,
                    c.expected_return * 100.0
                ));
            }
        }

        output.push_str(&format!(
            "\n{} of {} candidates scored\n",
            e.scored, e.evaluated
        ));
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let e = &self.export;
        let best = &e.suggestion;
        let mut output = String::new();

        output.push_str(&format!(
            "# Suggested addition: {} ({})\n\n",
            best.ticker, best.company_name
        ));
        output.push_str(&format!(
            "**Investment:** {:.2}\n\n",
            e.investment_amount
        ));

        output.push_str("## Portfolio With Addition\n\n");
        output.push_str(&format!(
            "- **Sharpe-like Score:** {:.3}\n",
            best.sharpe_ratio
        ));
        output.push_str(&format!(
            "- **Weighted Correlation:** {:.3}\n",
            best.correlation
        ));
        output.push_str(&format!(
            "- **Expected Return:** {:.2}%\n\n",
            best.expected_return * 100.0
        ));

        output.push_str("## ESG Risk\n\n");
        output.push_str(&format!("- **Current Portfolio:** {:.2}\n", e.esg.before));
        output.push_str(&format!("- **New Portfolio:** {:.2}\n", e.esg.after));
        output.push_str(&format!("- **Change:** {:+.2}\n", e.esg.delta));
        if !e.esg.missing.is_empty() {
            output.push_str(&format!(
                "- **No ESG data (counted as 0):** {}\n",
                join(&e.esg.missing)
            ));
        }
        output.push('\n');

        if !e.alternatives.is_empty() {
            output.push_str("## Top Candidates\n\n");
            output.push_str("| Rank | Ticker | Company | Score | Correlation | Return |\n");
            output.push_str("|------|--------|---------|-------|-------------|--------|\n");
            for c in &e.alternatives {
                output.push_str(&format!(
                    "| {} | {} | {} | {:.3} | {:.3} | {:.2}% |\n",
                    c.rank,
                    c.ticker,
                    c.company_name,
                    c.sharpe_ratio,
                    c.correlation,
                    c.expected_return * 100.0
                ));
            }
        }

        output
    }
}

impl fmt::Display for SuggestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

/// ESG profile of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgReport {
    /// Security symbol.
    pub ticker: Ticker,
    /// Company name, or the ticker when unknown.
    pub company_name: String,
    /// Score, or `None` when the provider had no data.
    pub score: Option<EsgScore>,
    /// Risk band of the total score.
    pub risk_level: Option<EsgRiskLevel>,
}

impl EsgReport {
    /// Build the report for `ticker`. Unknown tickers report no data.
    pub fn new(ticker: &Ticker, esg: &EsgScores, directory: &SecurityDirectory) -> Self {
        let score = esg.get(ticker.as_str()).and_then(EsgEntry::score).copied();
        Self {
            ticker: ticker.clone(),
            company_name: directory.display_name(ticker.as_str()).to_string(),
            risk_level: score.as_ref().map(EsgScore::risk_level),
            score,
        }
    }

    /// Format as plain text.
    pub fn to_text(&self) -> String {
        let (Some(score), Some(level)) = (&self.score, self.risk_level) else {
            return format!("There is no ESG data available for {}.\n", self.company_name);
        };

        let mut output = String::new();
        output.push_str(&format!(
            "ESG risk profile: {} ({})\n",
            self.company_name, self.ticker
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');
        output.push_str(
            "A total ESG risk score reflects exposure to environmental, social and \
             governance risks\nand how well they are managed. Lower is better.\n\n",
        );
        output.push_str(&format!(
            "  Total ESG Risk:           {:.2} ({})\n",
            score.total,
            level.description()
        ));
        output.push_str(&format!(
            "  Environmental:            {:.2}  carbon emissions, waste, resource use\n",
            score.environmental
        ));
        output.push_str(&format!(
            "  Social:                   {:.2}  labour relations, community, customers\n",
            score.social
        ));
        output.push_str(&format!(
            "  Governance:               {:.2}  executive pay, shareholder rights, ethics\n",
            score.governance
        ));
        if !score.is_consistent(wealthspread_data::esg::DEFAULT_COMPONENT_TOLERANCE) {
            output.push_str("  Note: component scores do not add up to the total.\n");
        }
        output
    }

    /// Format as Markdown.
    pub fn to_markdown(&self) -> String {
        let (Some(score), Some(level)) = (&self.score, self.risk_level) else {
            return format!(
                "# ESG: {} ({})\n\nNo ESG data available.\n",
                self.company_name, self.ticker
            );
        };

        let mut output = String::new();
        output.push_str(&format!("# ESG: {} ({})\n\n", self.company_name, self.ticker));
        output.push_str("| Category | Risk Score |\n");
        output.push_str("|----------|------------|\n");
        output.push_str(&format!(
            "| Total | {:.2} ({}) |\n",
            score.total,
            level.name()
        ));
        output.push_str(&format!("| Environmental | {:.2} |\n", score.environmental));
        output.push_str(&format!("| Social | {:.2} |\n", score.social));
        output.push_str(&format!("| Governance | {:.2} |\n", score.governance));
        output
    }
}

impl fmt::Display for EsgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn join(tickers: &[Ticker]) -> String {
    tickers
        .iter()
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wealthspread_data::SecurityInfo;
    use wealthspread_suggest::{EsgBlend, Holdings, ScoredCandidate};

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn suggestion(missing: Vec<Ticker>) -> Suggestion {
        let best = ScoredCandidate {
            ticker: t("GOOG"),
            score: 0.1,
            weighted_correlation: 0.6,
            expected_return: 0.06,
        };
        Suggestion {
            holdings: Holdings::from([(t("AAPL"), 1000.0)]),
            investment_amount: 1000.0,
            alternatives: vec![best.clone()],
            best,
            esg: EsgBlend {
                before: 15.0,
                after: 22.5,
                delta: 7.5,
                missing,
            },
            evaluated: 3,
            scored: 1,
        }
    }

    #[test]
    fn test_suggestion_ascii() {
        let mut directory = SecurityDirectory::new();
        directory.insert(t("GOOG"), SecurityInfo::named("Alphabet Inc."));
        let report = SuggestionReport::new(&suggestion(vec![]), &directory);
        let text = report.to_ascii_table();

        assert!(text.contains("Suggested addition: GOOG (Alphabet Inc.)"));
        assert!(text.contains("Sharpe-like Score:        0.100"));
        assert!(text.contains("Expected Return:          6.00%"));
        assert!(text.contains("Change:                   +7.50"));
        assert!(text.contains("1 of 3 candidates scored"));
        assert!(!text.contains("No ESG data"));
        assert_eq!(report.to_string(), text);
    }

    #[test]
    fn test_suggestion_flags_missing_esg() {
        let report = SuggestionReport::new(
            &suggestion(vec![t("AAPL"), t("GOOG")]),
            &SecurityDirectory::new(),
        );
        assert!(
            report
                .to_ascii_table()
                .contains("No ESG data (counted as 0): AAPL, GOOG")
        );
        let md = report.to_markdown();
        assert!(md.starts_with("# Suggested addition: GOOG (GOOG)"));
        assert!(md.contains("| 1 | GOOG | GOOG | 0.100 | 0.600 | 6.00% |"));
        assert!(md.contains("AAPL, GOOG"));
    }

    #[rstest]
    #[case(12.0, "Low risk")]
    #[case(21.2, "Medium risk")]
    #[case(31.0, "High risk")]
    fn test_esg_report(#[case] total: f64, #[case] label: &str) {
        let mut esg = EsgScores::new();
        esg.insert(
            t("XOM"),
            EsgEntry::Available(EsgScore {
                total,
                environmental: total / 2.0,
                social: total / 4.0,
                governance: total / 4.0,
            }),
        );
        let report = EsgReport::new(&t("XOM"), &esg, &SecurityDirectory::new());
        let text = report.to_text();

        assert!(text.contains(label));
        assert!(!text.contains("do not add up"));
        assert_eq!(report.risk_level, Some(EsgRiskLevel::from_total(total)));
    }

    #[test]
    fn test_esg_report_inconsistent_components() {
        let mut esg = EsgScores::new();
        esg.insert(
            t("XOM"),
            EsgEntry::Available(EsgScore {
                total: 30.0,
                environmental: 5.0,
                social: 5.0,
                governance: 5.0,
            }),
        );
        let text = EsgReport::new(&t("XOM"), &esg, &SecurityDirectory::new()).to_text();
        assert!(text.contains("do not add up"));
    }

    #[test]
    fn test_esg_report_unavailable() {
        let mut esg = EsgScores::new();
        esg.insert(t("BRK.B"), EsgEntry::Unavailable);
        let mut directory = SecurityDirectory::new();
        directory.insert(t("BRK.B"), SecurityInfo::named("Berkshire Hathaway"));

        let report = EsgReport::new(&t("BRK.B"), &esg, &directory);
        assert_eq!(report.score, None);
        assert_eq!(
            report.to_text(),
            "There is no ESG data available for Berkshire Hathaway.\n"
        );
        assert!(report.to_markdown().contains("No ESG data available."));

        let unknown = EsgReport::new(&t("ZZZ"), &esg, &directory);
        assert_eq!(unknown.risk_level, None);
    }
}
