use ashare_core::{Outcome, SearchRequest};
use serde_json::Value;

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandContext;

pub async fn run(args: &SearchArgs, context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    let Some(keyword) = args.keyword.as_deref() else {
        return Ok(Outcome::fail("keyword is required for 'search'"));
    };

    let request = match SearchRequest::new(keyword) {
        Ok(request) => request,
        Err(error) => return Ok(Outcome::fail(error.message().to_owned())),
    };

    match context.chain.search(&request).await {
        Ok(outcome) => {
            let count = outcome.value.len();
            let data = serde_json::to_value(outcome.value)?;
            Ok(Outcome::ok(data)
                .with_message(format!("{count} matches"))
                .with_source(outcome.source.as_str()))
        }
        Err(error) => Ok(Outcome::fail(error.to_string())),
    }
}
