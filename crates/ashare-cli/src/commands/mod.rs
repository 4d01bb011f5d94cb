mod basic;
mod history;
mod news;
mod quote;
mod search;
mod stock_list;
mod sync;
mod test;

use std::sync::Arc;

use ashare_core::{
    DataSource, EastmoneyAdapter, FallbackChain, HttpClient, Outcome, ProviderConfig,
    ReqwestHttpClient, StaticCatalog, TushareAdapter,
};
use serde_json::Value;

use crate::cli::{Action, Cli};
use crate::error::CliError;
use crate::output::ProgressWriter;

/// Shared wiring for every action: the fallback chain for reads, plus a
/// direct handle on the tushare adapter for the warehouse actions that
/// need full `stock_basic` rows.
pub struct CommandContext {
    pub chain: FallbackChain,
    pub tushare: Arc<TushareAdapter>,
}

pub async fn run(cli: Cli) -> Result<Outcome<Value>, CliError> {
    let Some(action) = cli.action else {
        return Err(CliError::MissingAction);
    };

    let context = build_context(cli.quiet);

    match action {
        Action::Test => test::run(&context).await,
        Action::StockList => stock_list::run(&context).await,
        Action::Quote(args) => quote::run(&args, &context).await,
        Action::History(args) => history::run(&args, &context).await,
        Action::Search(args) => search::run(&args, &context).await,
        Action::News(args) => news::run(&args, &context).await,
        Action::Sync => sync::run(&context).await,
        Action::Basic => basic::run(&context).await,
        Action::Unknown(args) => Ok(unknown(&args)),
    }
}

fn build_context(quiet: bool) -> CommandContext {
    let config = ProviderConfig::from_env();
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    let tushare = Arc::new(TushareAdapter::new(http.clone(), config.tushare_token));
    let sources: Vec<Arc<dyn DataSource>> = vec![
        Arc::new(EastmoneyAdapter::new(http)),
        tushare.clone(),
        Arc::new(StaticCatalog::new()),
    ];

    let chain = FallbackChain::new(sources, config.chain_timeout)
        .with_sink(Arc::new(ProgressWriter::new(!quiet)));

    CommandContext { chain, tushare }
}

fn unknown(args: &[String]) -> Outcome<Value> {
    let action = args.first().map(String::as_str).unwrap_or("<none>");
    Outcome::fail(format!("unknown action '{action}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_becomes_failure_envelope() {
        let envelope = unknown(&["frobnicate".to_owned(), "now".to_owned()]);
        assert!(!envelope.success);
        assert_eq!(
            envelope.message.as_deref(),
            Some("unknown action 'frobnicate'")
        );
    }
}
