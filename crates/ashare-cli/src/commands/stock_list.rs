use ashare_core::Outcome;
use serde_json::Value;

use crate::error::CliError;

use super::CommandContext;

pub async fn run(context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    match context.chain.stock_list().await {
        Ok(outcome) => {
            let count = outcome.value.len();
            let data = serde_json::to_value(outcome.value)?;
            Ok(Outcome::ok(data)
                .with_message(format!("{count} listings"))
                .with_source(outcome.source.as_str()))
        }
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
