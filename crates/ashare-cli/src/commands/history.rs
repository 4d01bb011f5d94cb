use ashare_core::{HistoryRequest, Outcome, Period, Symbol, ValidationError};
use serde_json::Value;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::CommandContext;

pub async fn run(args: &HistoryArgs, context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    let Some(raw) = args.symbol.as_deref() else {
        return Ok(Outcome::fail("symbol is required for 'history'"));
    };

    let period = match args.period.parse::<Period>() {
        Ok(period) => period,
        Err(error) => return Ok(Outcome::fail(error.to_string())),
    };

    let count = match args.count.trim().parse::<usize>() {
        Ok(count) => count,
        Err(_) => {
            let error = ValidationError::InvalidCount {
                value: args.count.clone(),
            };
            return Ok(Outcome::fail(error.to_string()));
        }
    };

    let request = match HistoryRequest::new(Symbol::normalize(raw), period, count) {
        Ok(request) => request,
        Err(error) => return Ok(Outcome::fail(error.message().to_owned())),
    };

    match context.chain.history(&request).await {
        Ok(outcome) => {
            let count = outcome.value.len();
            let data = serde_json::to_value(outcome.value)?;
            Ok(Outcome::ok(data)
                .with_message(format!("{count} bars"))
                .with_source(outcome.source.as_str()))
        }
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
