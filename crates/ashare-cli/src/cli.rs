use clap::{Args, Parser, Subcommand};

/// A-share market data CLI.
///
/// Fetches quotes, history, listings, search results and news for
/// Shanghai/Shenzhen/Beijing listed stocks, with automatic provider
/// fallback and a local DuckDB catalog cache.
#[derive(Debug, Parser)]
#[command(name = "ashare", version, about = "A-share market data CLI")]
pub struct Cli {
    /// Suppress per-tier progress diagnostics; print only the final line.
    #[arg(long, global = true, default_value_t = false)]
    pub quiet: bool,

    #[command(subcommand)]
    pub action: Option<Action>,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Probe provider connectivity.
    Test,

    /// Fetch the full A-share listing catalog.
    StockList,

    /// Fetch a real-time quote for one symbol.
    ///
    /// Accepts `600000`, `sh600000` or `600000.SH` spellings.
    Quote(QuoteArgs),

    /// Fetch historical OHLCV bars for one symbol.
    History(HistoryArgs),

    /// Search listings by code or name substring.
    Search(SearchArgs),

    /// Fetch the latest market news headlines.
    News(NewsArgs),

    /// Refresh the local stock_basic snapshot from the provider.
    Sync,

    /// Full stock_basic rows, falling back to the local snapshot.
    Basic,

    /// Any unrecognized action; reported as a failure envelope rather
    /// than a usage error, so callers always get one JSON line back.
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Stock symbol, e.g. 600000 or 000001.SZ.
    pub symbol: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Stock symbol, e.g. 600000 or 000001.SZ.
    pub symbol: Option<String>,

    /// Bar period: daily, weekly or monthly.
    #[arg(default_value = "daily")]
    pub period: String,

    /// Number of most recent bars to return.
    #[arg(default_value = "180")]
    pub count: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Code or name substring to match.
    pub keyword: Option<String>,
}

#[derive(Debug, Args)]
pub struct NewsArgs {
    /// Number of headlines to return.
    #[arg(default_value = "5")]
    pub count: String,
}
