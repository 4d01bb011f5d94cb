use ashare_core::Outcome;
use ashare_warehouse::Warehouse;
use serde_json::Value;

use crate::error::CliError;

use super::CommandContext;

/// Full `stock_basic` rows, API first with the local snapshot as the
/// last tier. The `source` tag tells the caller which one answered.
pub async fn run(context: &CommandContext) -> Result<Outcome<Value>, CliError> {
    match context.tushare.stock_basic_rows().await {
        Ok(rows) => {
            // Refresh the snapshot while we have fresh rows; serving the
            // data still succeeds if the local write does not.
            if let Ok(warehouse) = Warehouse::open_default() {
                let _ = warehouse.replace_stock_basic(&rows);
            }

            let count = rows.len();
            let data = serde_json::to_value(rows)?;
            Ok(Outcome::ok(data)
                .with_message(format!("{count} rows"))
                .with_source("api"))
        }
        Err(api_error) => serve_snapshot(&api_error.to_string()),
    }
}

fn serve_snapshot(api_detail: &str) -> Result<Outcome<Value>, CliError> {
    let warehouse = match Warehouse::open_default() {
        Ok(warehouse) => warehouse,
        Err(error) => {
            return Ok(Outcome::fail(format!(
                "provider failed ({api_detail}) and warehouse is unavailable: {error}"
            )))
        }
    };

    let rows = match warehouse.read_stock_basic() {
        Ok(rows) => rows,
        Err(error) => {
            return Ok(Outcome::fail(format!(
                "provider failed ({api_detail}) and snapshot read failed: {error}"
            )))
        }
    };

    if rows.is_empty() {
        return Ok(Outcome::fail(format!(
            "provider failed ({api_detail}) and no local snapshot exists; run 'ashare sync' first"
        )));
    }

    let freshness = warehouse
        .last_updated("stock_basic")
        .ok()
        .flatten()
        .unwrap_or_else(|| String::from("unknown"));

    let count = rows.len();
    let data = serde_json::to_value(rows)?;
    Ok(Outcome::ok(data)
        .with_message(format!("{count} rows from local snapshot ({freshness})"))
        .with_source("database"))
}
