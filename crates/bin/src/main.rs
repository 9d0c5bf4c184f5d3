//! Wealthspread CLI binary.
//!
//! Fills the local cache with market data, rebuilds the market model and
//! suggests the next addition to a portfolio.

mod integration;

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager::{DataDir, default_data_dir};
use integration::data_pipeline::{
    DEFAULT_CONCURRENCY, FetchConfig, fetch_universe, import_files, window_start,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wealthspread::universe::Constituent;
use wealthspread::{GicsSector, MarketModel, Sp500Universe};
use wealthspread_data::twelvedata::TwelveDataClient;
use wealthspread_data::{SecurityDirectory, Ticker};
use wealthspread_model::ReturnModelConfig;
use wealthspread_output::{EsgReport, ExportFormat, Exporter, SuggestionExport, SuggestionReport};
use wealthspread_suggest::{Holdings, SuggestConfig, SuggestError, suggest_addition};

#[derive(Parser)]
#[command(name = "wealthspread")]
#[command(about = "Suggest the next addition to a portfolio", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the cache and the market model
    #[arg(long, global = true, env = "WEALTHSPREAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily closes into the cache
    Fetch {
        /// Tickers to fetch (defaults to the universe)
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<Ticker>,

        /// Years of history to fetch
        #[arg(long, default_value_t = 5.0)]
        years: f64,

        /// Last day of the window (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Requests in flight at once
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Seconds to wait after each request
        #[arg(long, default_value_t = 8.0)]
        rate_limit: f64,

        /// Fetch even when closes are already cached
        #[arg(long)]
        refresh: bool,

        /// Twelve Data API key
        #[arg(long, env = "TWELVEDATA_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Copy JSON data files into the cache
    Import {
        /// Closes as `{ticker: {date: close}}`
        #[arg(long)]
        prices: Option<PathBuf>,

        /// ESG scores per ticker
        #[arg(long)]
        esg: Option<PathBuf>,

        /// Company details per ticker
        #[arg(long)]
        securities: Option<PathBuf>,
    },

    /// Rebuild the correlation matrix and return map from cached closes
    Build {
        /// Length of the price window in years
        #[arg(long, default_value_t = 5.0)]
        years: f64,

        /// Ceiling on annualised returns
        #[arg(long, default_value_t = 0.45)]
        cap: f64,

        /// Last day of the window (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest the best addition to a portfolio
    Suggest {
        /// Current position as TICKER=AMOUNT (repeatable)
        #[arg(long = "holding", value_parser = parse_holding, required = true)]
        holdings: Vec<(Ticker, f64)>,

        /// New money to invest
        #[arg(long)]
        amount: f64,

        /// Order candidates round-robin by sector before truncating
        #[arg(long)]
        interleave_sectors: bool,

        /// Candidates considered for a portfolio of at most one holding
        #[arg(long, default_value_t = 30)]
        small_limit: usize,

        /// Candidates considered for larger portfolios
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Consider every candidate
        #[arg(long, conflicts_with_all = ["small_limit", "limit"])]
        exhaustive: bool,

        /// Ranked candidates to report
        #[arg(long, default_value_t = 3)]
        alternatives: usize,

        /// Score candidates on one thread
        #[arg(long)]
        sequential: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the ESG risk of a ticker
    Esg {
        /// Ticker symbol
        ticker: Ticker,

        /// Render as Markdown
        #[arg(long)]
        markdown: bool,
    },

    /// List the candidate universe
    Tickers {
        /// Only tickers in this sector
        #[arg(long)]
        sector: Option<String>,

        /// Order round-robin by sector
        #[arg(long)]
        interleave_sectors: bool,

        /// List all sectors
        #[arg(long)]
        list_sectors: bool,
    },

    /// Show or clear the cache
    Cache {
        /// Remove everything cached for a ticker
        #[arg(long)]
        clear: Option<Ticker>,

        /// Remove everything
        #[arg(long, conflicts_with = "clear")]
        clear_all: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
    PrettyJson,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = DataDir::new(cli.data_dir.unwrap_or_else(default_data_dir));
    tracing::debug!(data_dir = %data_dir.root().display(), "using data directory");

    match cli.command {
        Commands::Fetch {
            tickers,
            years,
            end,
            concurrency,
            rate_limit,
            refresh,
            api_key,
        } => {
            let mut config = FetchConfig::trailing(end.unwrap_or_else(today), years);
            config.concurrency = concurrency;
            config.force_refresh = refresh;
            let delay = Duration::try_from_secs_f64(rate_limit)
                .with_context(|| format!("invalid --rate-limit {}", rate_limit))?;
            let client = TwelveDataClient::new(api_key)
                .with_cache_dir(data_dir.responses_dir())
                .with_rate_limit(delay);
            fetch(&data_dir, &client, tickers, &config).await?;
        }
        Commands::Import {
            prices,
            esg,
            securities,
        } => {
            if prices.is_none() && esg.is_none() && securities.is_none() {
                bail!("nothing to import; pass --prices, --esg or --securities");
            }
            let cache = data_dir.open_cache()?;
            let summary = import_files(
                &cache,
                prices.as_deref(),
                esg.as_deref(),
                securities.as_deref(),
            )?;
            println!(
                "Imported {} price series, {} ESG entries, {} securities",
                summary.series, summary.esg, summary.securities
            );
        }
        Commands::Build {
            years,
            cap,
            end,
            json,
        } => {
            build(&data_dir, ReturnModelConfig { years, cap }, end.unwrap_or_else(today), json)?;
        }
        Commands::Suggest {
            holdings,
            amount,
            interleave_sectors,
            small_limit,
            limit,
            exhaustive,
            alternatives,
            sequential,
            format,
        } => {
            let config = if exhaustive {
                SuggestConfig {
                    alternatives,
                    parallel: !sequential,
                    ..SuggestConfig::exhaustive()
                }
            } else {
                SuggestConfig {
                    small_portfolio_limit: Some(small_limit),
                    candidate_limit: Some(limit),
                    alternatives,
                    parallel: !sequential,
                }
            };
            let holdings: Holdings = collect_holdings(holdings);
            suggest(&data_dir, &holdings, amount, interleave_sectors, &config, format)?;
        }
        Commands::Esg { ticker, markdown } => {
            let cache = data_dir.open_cache()?;
            let report = EsgReport::new(&ticker, &cache.esg_scores()?, &cache.securities()?);
            if markdown {
                println!("{}", report.to_markdown());
            } else {
                print!("{}", report.to_text());
            }
        }
        Commands::Tickers {
            sector,
            interleave_sectors,
            list_sectors,
        } => {
            if list_sectors {
                list_all_sectors();
            } else {
                let directory = data_dir.open_cache()?.securities()?;
                list_tickers(&universe_for(&directory, None), sector.as_deref(), interleave_sectors)?;
            }
        }
        Commands::Cache { clear, clear_all } => {
            let cache = data_dir.open_cache()?;
            if clear_all {
                cache.clear_all()?;
                println!("Cleared {}", data_dir.cache_path().display());
            } else if let Some(ticker) = clear {
                cache.clear_symbol(ticker.as_str())?;
                println!("Cleared {}", ticker);
            }
            let stats = cache.get_stats()?;
            println!("Cache: {}", data_dir.cache_path().display());
            println!("  Tickers with closes: {}", stats.unique_symbols);
            println!("  Daily closes:        {}", stats.total_closes);
            println!("  ESG scores:          {}", stats.esg_scores);
            println!("  Securities:          {}", stats.securities);
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse `TICKER=AMOUNT`.
fn parse_holding(raw: &str) -> Result<(Ticker, f64), String> {
    let (symbol, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TICKER=AMOUNT, got {:?}", raw))?;
    let ticker = Ticker::new(symbol).map_err(|e| e.to_string())?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount {:?}: {}", amount, e))?;
    Ok((ticker, amount))
}

/// Sum repeated positions in the same ticker.
fn collect_holdings(pairs: Vec<(Ticker, f64)>) -> Holdings {
    let mut holdings = Holdings::new();
    for (ticker, amount) in pairs {
        *holdings.entry(ticker).or_insert(0.0) += amount;
    }
    holdings
}

/// Universe of every security on file, or of `tickers` when there is no
/// metadata, or the built-in list when there is neither.
fn universe_for(directory: &SecurityDirectory, tickers: Option<&[Ticker]>) -> Sp500Universe {
    if !directory.is_empty() {
        return Sp500Universe::from_directory(directory);
    }
    let fallback = Sp500Universe::fallback();
    match tickers {
        Some(tickers) if !tickers.is_empty() => Sp500Universe::new(
            tickers
                .iter()
                .map(|t| Constituent::new(t.clone(), fallback.sector(t.as_str()))),
        ),
        _ => fallback,
    }
}

async fn fetch(
    data_dir: &DataDir,
    client: &TwelveDataClient,
    tickers: Vec<Ticker>,
    config: &FetchConfig,
) -> anyhow::Result<()> {
    let cache = data_dir.open_cache()?;
    let tickers = if tickers.is_empty() {
        universe_for(&cache.securities()?, None).tickers()
    } else {
        tickers
    };

    println!(
        "Fetching daily closes for {} tickers ({} to {})",
        tickers.len(),
        config.start,
        config.end
    );

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    let summary = fetch_universe(client, &cache, &tickers, config, Some(&pb)).await?;
    pb.finish_and_clear();

    println!(
        "  {} cached, {} fetched, {} failed",
        summary.cached,
        summary.fetched,
        summary.failed.len()
    );
    for (ticker, error) in &summary.failed {
        println!("  {:<6} {}", ticker.as_str(), error);
    }
    Ok(())
}

fn build(
    data_dir: &DataDir,
    config: ReturnModelConfig,
    end: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let cache = data_dir.open_cache()?;
    let history = cache.price_history(window_start(end, config.years), end)?;
    if history.is_empty() {
        bail!(
            "no cached closes in {}; run `wealthspread fetch` or `wealthspread import` first",
            data_dir.cache_path().display()
        );
    }

    let refresh = MarketModel::refresh(&history, &config)?;
    let model_dir = data_dir.model_dir();
    refresh
        .model
        .save(&model_dir)
        .with_context(|| format!("saving market model to {}", model_dir.display()))?;

    if json {
        let summary = json!({
            "model_dir": model_dir,
            "correlated": refresh.model.correlations.tickers(),
            "with_returns": refresh.model.returns.len(),
            "correlations_excluded": refresh.correlations_excluded,
            "returns_excluded": refresh.returns_excluded,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Market model written to {}", model_dir.display());
    println!(
        "  Correlation matrix: {} tickers",
        refresh.model.correlations.len()
    );
    println!("  Return map:         {} tickers", refresh.model.returns.len());
    for excluded in refresh
        .correlations_excluded
        .iter()
        .chain(&refresh.returns_excluded)
    {
        println!("  excluded {:<6} {}", excluded.ticker.as_str(), excluded.error);
    }
    Ok(())
}

fn suggest(
    data_dir: &DataDir,
    holdings: &Holdings,
    amount: f64,
    interleave_sectors: bool,
    config: &SuggestConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cache = data_dir.open_cache()?;
    let esg = cache.esg_scores()?;
    let directory = cache.securities()?;
    let model = MarketModel::load(&data_dir.model_dir())?;

    let universe = universe_for(&directory, Some(model.correlations.tickers()));
    let candidates = if interleave_sectors {
        universe.sector_interleaved()
    } else {
        universe.tickers()
    };

    let suggestion = match suggest_addition(
        holdings,
        amount,
        &model.artifacts(&esg),
        &candidates,
        config,
    ) {
        Ok(suggestion) => suggestion,
        Err(SuggestError::NoEligibleCandidate { evaluated }) => {
            println!(
                "could not suggest: none of the {} candidates could be scored",
                evaluated
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text => print!("{}", SuggestionReport::new(&suggestion, &directory)),
        OutputFormat::Markdown => {
            print!("{}", SuggestionReport::new(&suggestion, &directory).to_markdown());
        }
        OutputFormat::Json | OutputFormat::PrettyJson | OutputFormat::Csv => {
            let export_format = match format {
                OutputFormat::Json => ExportFormat::Json,
                OutputFormat::Csv => ExportFormat::Csv,
                _ => ExportFormat::PrettyJson,
            };
            let export = SuggestionExport::new(&suggestion, &directory);
            println!("{}", export.export_to_string(export_format)?);
        }
    }
    Ok(())
}

fn list_all_sectors() {
    println!("GICS Sectors:");
    println!("=============\n");

    for sector in GicsSector::ALL {
        println!("  {}", sector.name());
    }
}

fn list_tickers(
    universe: &Sp500Universe,
    sector: Option<&str>,
    interleave_sectors: bool,
) -> anyhow::Result<()> {
    let filter = sector
        .map(|name| {
            GicsSector::from_name(name).with_context(|| format!("unknown sector {:?}", name))
        })
        .transpose()?;

    let tickers = if interleave_sectors {
        universe.sector_interleaved()
    } else {
        universe.tickers()
    };

    for ticker in tickers {
        let ticker_sector = universe.sector(ticker.as_str());
        if filter.is_some() && ticker_sector != filter {
            continue;
        }
        println!(
            "{:<6} {}",
            ticker.as_str(),
            ticker_sector.map_or("Unclassified", |s| s.name())
        );
    }
    Ok(())
}
