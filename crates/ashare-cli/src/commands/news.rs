use ashare_core::{NewsRequest, Outcome, ValidationError};
use serde_json::Value;

use crate::cli::NewsArgs;
use crate::error::CliError;

use super::CommandContext;

pub async fn run(args: &NewsArgs, context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    let count = match args.count.trim().parse::<usize>() {
        Ok(count) => count,
        Err(_) => {
            let error = ValidationError::InvalidCount {
                value: args.count.clone(),
            };
            return Ok(Outcome::fail(error.to_string()));
        }
    };

    let request = match NewsRequest::new(count) {
        Ok(request) => request,
        Err(error) => return Ok(Outcome::fail(error.message().to_owned())),
    };

    match context.chain.news(&request).await {
        Ok(outcome) => {
            let count = outcome.value.len();
            let data = serde_json::to_value(outcome.value)?;
            Ok(Outcome::ok(data)
                .with_message(format!("{count} headlines"))
                .with_source(outcome.source.as_str()))
        }
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
