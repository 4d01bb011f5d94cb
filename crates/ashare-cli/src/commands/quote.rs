use ashare_core::{Outcome, QuoteRequest, Symbol};
use serde_json::Value;

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::CommandContext;

pub async fn run(args: &QuoteArgs, context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    let Some(raw) = args.symbol.as_deref() else {
        return Ok(Outcome::fail("symbol is required for 'quote'"));
    };

    let request = QuoteRequest::new(Symbol::normalize(raw));
    match context.chain.quote(&request).await {
        Ok(outcome) => {
            let data = serde_json::to_value(outcome.value)?;
            Ok(Outcome::ok(data).with_source(outcome.source.as_str()))
        }
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
