use std::time::Duration;

use ashare_core::{Outcome, SourceError, SourceErrorKind};
use ashare_warehouse::Warehouse;
use serde_json::{json, Value};

use crate::error::CliError;

use super::CommandContext;

const SYNC_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Refresh the local `stock_basic` snapshot from tushare.
///
/// A rate-limited response waits out the quota window and retries; any
/// other provider error fails the sync immediately.
pub async fn run(context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    let warehouse = match Warehouse::open_default() {
        Ok(warehouse) => warehouse,
        Err(error) => return Ok(Outcome::fail(format!("failed to open warehouse: {error}"))),
    };

    let mut last_error: Option<SourceError> = None;

    for attempt in 1..=SYNC_ATTEMPTS {
        match context.tushare.stock_basic_rows().await {
            Ok(rows) => {
                return match warehouse.replace_stock_basic(&rows) {
                    Ok(written) => Ok(Outcome::ok(json!({
                        "table": "stock_basic",
                        "rows": written,
                    }))
                    .with_message(format!("synced {written} rows"))
                    .with_source("tushare")),
                    Err(error) => {
                        Ok(Outcome::fail(format!("failed to write snapshot: {error}")))
                    }
                };
            }
            Err(error) if error.kind() == SourceErrorKind::RateLimited
                && attempt < SYNC_ATTEMPTS =>
            {
                last_error = Some(error);
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(error) => {
                last_error = Some(error);
                break;
            }
        }
    }

    let detail = last_error
        .map(|error| error.to_string())
        .unwrap_or_else(|| String::from("no provider response"));
    Ok(Outcome::fail(format!("stock_basic sync failed: {detail}")))
}
