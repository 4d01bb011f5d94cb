use ashare_core::Outcome;
use serde_json::{json, Value};

use crate::error::CliError;

use super::CommandContext;

pub async fn run(context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    match context.chain.probe().await {
        Ok(outcome) => Ok(Outcome::ok(json!({ "provider": outcome.source.as_str() }))
            .with_message("data source connectivity ok")
            .with_source(outcome.source.as_str())),
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
