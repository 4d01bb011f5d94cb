//! Local stock catalog warehouse backed by an embedded DuckDB file.
//!
//! Holds a full `stock_basic` snapshot plus a per-table freshness stamp
//! so the CLI can fall back to cached listings when providers fail.

pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use duckdb::{Connection, ToSql};
use thiserror::Error;
use time::macros::{format_description, offset};
use time::OffsetDateTime;

use ashare_core::StockBasicRow;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("connection is poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub ashare_home: PathBuf,
    pub db_path: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let ashare_home = resolve_ashare_home();
        let db_path = ashare_home.join("data").join("ashare.duckdb");
        Self {
            ashare_home,
            db_path,
        }
    }
}

fn resolve_ashare_home() -> PathBuf {
    if let Some(path) = env::var_os("ASHARE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".ashare");
    }

    PathBuf::from(".ashare")
}

#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    connection: Arc<Mutex<Connection>>,
}

impl Warehouse {
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(&config.db_path)?;
        migrations::apply_migrations(&connection)?;

        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    /// Replace the full `stock_basic` snapshot in one transaction and
    /// stamp the freshness table. A partial write never survives.
    pub fn replace_stock_basic(&self, rows: &[StockBasicRow]) -> Result<usize, WarehouseError> {
        let connection = self.connection.lock().map_err(|_| WarehouseError::Poisoned)?;

        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            connection.execute_batch("DELETE FROM stock_basic")?;

            let mut insert = connection.prepare(
                "INSERT INTO stock_basic \
                 (ts_code, symbol, name, area, industry, cnspell, market, \
                  list_date, act_name, act_ent_type, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            )?;
            for row in rows {
                let params: [&dyn ToSql; 10] = [
                    &row.ts_code,
                    &row.symbol,
                    &row.name,
                    &row.area,
                    &row.industry,
                    &row.cnspell,
                    &row.market,
                    &row.list_date,
                    &row.act_name,
                    &row.act_ent_type,
                ];
                insert.execute(params.as_slice())?;
            }

            let stamp = now_stamp();
            let params: [&dyn ToSql; 1] = [&stamp];
            connection.execute(
                "INSERT OR REPLACE INTO data_update_time (table_name, updated_at) \
                 VALUES ('stock_basic', TRY_CAST(? AS TIMESTAMP))",
                params.as_slice(),
            )?;

            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    pub fn read_stock_basic(&self) -> Result<Vec<StockBasicRow>, WarehouseError> {
        let connection = self.connection.lock().map_err(|_| WarehouseError::Poisoned)?;

        let mut statement = connection.prepare(
            r#"
SELECT ts_code, symbol, name, area, industry, cnspell, market,
       list_date, act_name, act_ent_type
FROM stock_basic
ORDER BY ts_code
"#,
        )?;

        let rows = statement.query_map([], |row| {
            Ok(StockBasicRow {
                ts_code: row.get(0)?,
                symbol: row.get(1)?,
                name: row.get(2)?,
                area: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                industry: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                cnspell: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                market: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                list_date: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                act_name: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                act_ent_type: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            })
        })?;

        let mut output = Vec::new();
        for row in rows {
            output.push(row?);
        }
        Ok(output)
    }

    pub fn count_stock_basic(&self) -> Result<i64, WarehouseError> {
        let connection = self.connection.lock().map_err(|_| WarehouseError::Poisoned)?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM stock_basic", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Freshness stamp for a table, as `YYYY-MM-DD HH:MM:SS`, or `None`
    /// when the table has never been synced.
    pub fn last_updated(&self, table: &str) -> Result<Option<String>, WarehouseError> {
        let connection = self.connection.lock().map_err(|_| WarehouseError::Poisoned)?;

        let params: [&dyn ToSql; 1] = [&table];
        match connection.query_row(
            "SELECT strftime(updated_at, '%Y-%m-%d %H:%M:%S') \
             FROM data_update_time WHERE table_name = ?",
            params.as_slice(),
            |row| row.get::<_, String>(0),
        ) {
            Ok(stamp) => Ok(Some(stamp)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(WarehouseError::DuckDb(error)),
        }
    }
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Exchange-timezone (UTC+8) wall-clock stamp for the freshness table.
fn now_stamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .to_offset(offset!(+8))
        .format(&format)
        .unwrap_or_else(|_| String::from("1970-01-01 00:00:00"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_rows() -> Vec<StockBasicRow> {
        vec![
            StockBasicRow {
                ts_code: "600000.SH".to_owned(),
                symbol: "600000".to_owned(),
                name: "浦发银行".to_owned(),
                area: "上海".to_owned(),
                industry: "银行".to_owned(),
                cnspell: "pfyh".to_owned(),
                market: "主板".to_owned(),
                list_date: "19991110".to_owned(),
                act_name: String::new(),
                act_ent_type: String::new(),
            },
            StockBasicRow {
                ts_code: "000001.SZ".to_owned(),
                symbol: "000001".to_owned(),
                name: "平安银行".to_owned(),
                area: "深圳".to_owned(),
                industry: "银行".to_owned(),
                cnspell: "payh".to_owned(),
                market: "主板".to_owned(),
                list_date: "19910403".to_owned(),
                act_name: String::new(),
                act_ent_type: String::new(),
            },
        ]
    }

    fn open_temp() -> (tempfile::TempDir, Warehouse) {
        let temp = tempdir().expect("tempdir");
        let ashare_home = temp.path().join("ashare-home");
        let db_path = ashare_home.join("data").join("ashare.duckdb");
        let warehouse = Warehouse::open(WarehouseConfig {
            ashare_home,
            db_path,
        })
        .expect("warehouse open");
        (temp, warehouse)
    }

    #[test]
    fn open_applies_migrations_idempotently() {
        let temp = tempdir().expect("tempdir");
        let ashare_home = temp.path().join("ashare-home");
        let db_path = ashare_home.join("data").join("ashare.duckdb");
        let config = WarehouseConfig {
            ashare_home,
            db_path,
        };

        let first = Warehouse::open(config.clone()).expect("first open");
        assert_eq!(first.count_stock_basic().expect("count"), 0);
        drop(first);

        let second = Warehouse::open(config).expect("reopen");
        assert_eq!(second.count_stock_basic().expect("count"), 0);
        assert_eq!(second.last_updated("stock_basic").expect("stamp"), None);
    }

    #[test]
    fn replace_round_trips_rows_and_stamps_freshness() {
        let (_temp, warehouse) = open_temp();

        let written = warehouse
            .replace_stock_basic(&sample_rows())
            .expect("replace");
        assert_eq!(written, 2);

        let rows = warehouse.read_stock_basic().expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ts_code, "000001.SZ");
        assert_eq!(rows[1].name, "浦发银行");

        let stamp = warehouse
            .last_updated("stock_basic")
            .expect("stamp query")
            .expect("stamp present");
        assert_eq!(stamp.len(), 19);
    }

    #[test]
    fn replace_truncates_the_previous_snapshot() {
        let (_temp, warehouse) = open_temp();

        warehouse
            .replace_stock_basic(&sample_rows())
            .expect("first sync");

        let smaller = vec![sample_rows().remove(0)];
        warehouse
            .replace_stock_basic(&smaller)
            .expect("second sync");

        assert_eq!(warehouse.count_stock_basic().expect("count"), 1);
        let rows = warehouse.read_stock_basic().expect("read");
        assert_eq!(rows[0].ts_code, "600000.SH");
    }

    #[test]
    fn names_with_quotes_survive_the_round_trip() {
        let (_temp, warehouse) = open_temp();

        let mut rows = sample_rows();
        rows[0].act_name = "O'Neil 资本".to_owned();
        warehouse.replace_stock_basic(&rows).expect("replace");

        let read = warehouse.read_stock_basic().expect("read");
        let row = read
            .iter()
            .find(|row| row.ts_code == "600000.SH")
            .expect("row present");
        assert_eq!(row.act_name, "O'Neil 资本");
    }
}
