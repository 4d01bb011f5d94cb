use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::data_source::{
    CapabilitySet, DataSource, HistoryRequest, SearchRequest, SourceError,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{HistoryBar, Period, ProviderId, StockBasicRow, StockListing, Symbol};

use super::{num_f64, num_i64};

const API_URL: &str = "http://api.tushare.pro";

/// Substring tushare puts in its per-minute rate limit message.
const RATE_LIMIT_MARKER: &str = "每分钟最多访问该接口";

const STOCK_BASIC_FIELDS: &str =
    "ts_code,symbol,name,area,industry,cnspell,market,list_date,act_name,act_ent_type";

/// Tushare Pro adapter. Speaks the columnar `{fields, items}` wire format
/// and requires a token supplied through configuration.
pub struct TushareAdapter {
    http: Arc<dyn HttpClient>,
    token: Option<String>,
}

impl TushareAdapter {
    pub fn new(http: Arc<dyn HttpClient>, token: Option<String>) -> Self {
        Self { http, token }
    }

    async fn call(
        &self,
        api_name: &str,
        params: Value,
        fields: &str,
    ) -> Result<TushareFrame, SourceError> {
        let Some(token) = self.token.as_deref() else {
            return Err(SourceError::unavailable(
                "tushare token is not configured (set TUSHARE_TOKEN)",
            ));
        };

        let payload = json!({
            "api_name": api_name,
            "token": token,
            "params": params,
            "fields": fields,
        });

        let request = HttpRequest::post_json(API_URL, payload.to_string());
        let response = self.http.execute(request).await.map_err(|error| {
            SourceError::unavailable(format!("tushare transport error: {}", error.message()))
        })?;

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "tushare returned status {}",
                response.status
            )));
        }

        let parsed: TushareResponse = serde_json::from_str(&response.body).map_err(|error| {
            SourceError::internal(format!("failed to parse tushare response: {error}"))
        })?;

        if parsed.code != 0 {
            let msg = parsed.msg.unwrap_or_else(|| "unknown tushare error".to_owned());
            if msg.contains(RATE_LIMIT_MARKER) {
                return Err(SourceError::rate_limited(format!(
                    "tushare rate limit hit: {msg}"
                )));
            }
            return Err(SourceError::unavailable(format!("tushare error: {msg}")));
        }

        let frame = parsed
            .data
            .ok_or_else(|| SourceError::internal("tushare response carried no data frame"))?;

        if frame.items.is_empty() {
            return Err(SourceError::empty("tushare returned an empty frame"));
        }

        Ok(frame)
    }

    /// Full `stock_basic` frame mapped to warehouse rows. Used by the
    /// `sync`/`basic` actions, which add their own retry policy on top.
    pub async fn stock_basic_rows(&self) -> Result<Vec<StockBasicRow>, SourceError> {
        let frame = self
            .call("stock_basic", json!({}), STOCK_BASIC_FIELDS)
            .await?;

        frame
            .rows()
            .map(|row| {
                Ok(StockBasicRow {
                    ts_code: row.text("ts_code")?,
                    symbol: row.text("symbol")?,
                    name: row.text("name")?,
                    area: row.text_or_default("area"),
                    industry: row.text_or_default("industry"),
                    cnspell: row.text_or_default("cnspell"),
                    market: row.text_or_default("market"),
                    list_date: row.text_or_default("list_date"),
                    act_name: row.text_or_default("act_name"),
                    act_ent_type: row.text_or_default("act_ent_type"),
                })
            })
            .collect()
    }

    async fn listings(&self) -> Result<Vec<StockListing>, SourceError> {
        let rows = self.stock_basic_rows().await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let symbol = Symbol::normalize(&row.ts_code);
                let industry = Some(row.industry).filter(|v| !v.is_empty());
                StockListing::from_columns(symbol, row.name, industry)
            })
            .collect())
    }
}

#[async_trait]
impl DataSource for TushareAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Tushare
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(false, true, true, true, false)
    }

    async fn probe(&self) -> Result<(), SourceError> {
        self.call("stock_basic", json!({"limit": "5"}), "ts_code,name")
            .await
            .map(|_| ())
    }

    async fn history(&self, req: &HistoryRequest) -> Result<Vec<HistoryBar>, SourceError> {
        let api_name = match req.period {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        };

        let frame = self
            .call(
                api_name,
                json!({"ts_code": req.symbol.as_str()}),
                "trade_date,open,high,low,close,vol,amount",
            )
            .await?;

        // Tushare ships newest-first; the output schema is ascending.
        let mut bars = frame
            .rows()
            .take(req.count)
            .map(|row| {
                Ok(HistoryBar {
                    date: dash_date(&row.text("trade_date")?),
                    open: num_f64(row.cell("open")?, "open")?,
                    high: num_f64(row.cell("high")?, "high")?,
                    low: num_f64(row.cell("low")?, "low")?,
                    close: num_f64(row.cell("close")?, "close")?,
                    volume: num_i64(row.cell("vol")?, "vol")?,
                    // Suspended days carry a null amount; default it.
                    amount: match row.cell("amount")? {
                        Value::Null => 0.0,
                        cell => num_f64(cell, "amount")?,
                    },
                })
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        bars.reverse();
        Ok(bars)
    }

    async fn stock_list(&self) -> Result<Vec<StockListing>, SourceError> {
        self.listings().await
    }

    async fn search(&self, req: &SearchRequest) -> Result<Vec<StockListing>, SourceError> {
        let listings = self.listings().await?;
        Ok(listings
            .into_iter()
            .filter(|listing| listing.matches(&req.keyword))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareFrame>,
}

/// Columnar tushare data frame: one `fields` header plus row arrays.
#[derive(Debug, Deserialize)]
struct TushareFrame {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

impl TushareFrame {
    fn rows(&self) -> impl Iterator<Item = FrameRow<'_>> {
        self.items.iter().map(move |cells| FrameRow {
            fields: &self.fields,
            cells,
        })
    }
}

struct FrameRow<'a> {
    fields: &'a [String],
    cells: &'a [Value],
}

impl FrameRow<'_> {
    fn cell(&self, name: &str) -> Result<&Value, SourceError> {
        let index = self
            .fields
            .iter()
            .position(|field| field == name)
            .ok_or_else(|| {
                SourceError::internal(format!("tushare frame is missing column '{name}'"))
            })?;
        self.cells.get(index).ok_or_else(|| {
            SourceError::internal(format!("tushare row is shorter than column '{name}'"))
        })
    }

    fn text(&self, name: &str) -> Result<String, SourceError> {
        match self.cell(name)? {
            Value::String(raw) => Ok(raw.clone()),
            Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }

    fn text_or_default(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }
}

/// `20240102` -> `2024-01-02`; anything shorter passes through unchanged.
fn dash_date(raw: &str) -> String {
    if raw.len() == 8 && raw.chars().all(|ch| ch.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::ScriptedHttpClient;

    fn adapter_with(client: Arc<ScriptedHttpClient>) -> TushareAdapter {
        TushareAdapter::new(client, Some("test-token".to_owned()))
    }

    fn stock_basic_body() -> String {
        serde_json::json!({
            "code": 0,
            "msg": null,
            "data": {
                "fields": ["ts_code", "symbol", "name", "area", "industry", "cnspell",
                           "market", "list_date", "act_name", "act_ent_type"],
                "items": [
                    ["000001.SZ", "000001", "平安银行", "深圳", "银行", "payh",
                     "主板", "19910403", "无实际控制人", "无"],
                    ["600000.SH", "600000", "浦发银行", "上海", null, "pfyh",
                     "主板", "19991110", "", ""]
                ]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn missing_token_degrades_without_calling_upstream() {
        let client = Arc::new(ScriptedHttpClient::new());
        let adapter = TushareAdapter::new(client.clone(), None);

        let error = adapter.stock_list().await.expect_err("no token configured");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(client.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn decodes_columnar_stock_basic_frame() {
        let client = Arc::new(ScriptedHttpClient::new());
        client.push_ok(stock_basic_body());
        let adapter = adapter_with(client);

        let listings = adapter.stock_list().await.expect("frame decodes");
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].symbol.as_str(), "000001.SZ");
        assert_eq!(listings[0].market, "深圳");
        assert_eq!(listings[0].industry, "银行");
        // null industry falls back to the declared default
        assert_eq!(listings[1].industry, "未知");
    }

    #[tokio::test]
    async fn search_filters_locally_on_symbol_or_name() {
        let client = Arc::new(ScriptedHttpClient::new());
        client.push_ok(stock_basic_body());
        let adapter = adapter_with(client);

        let request = SearchRequest::new("浦发").expect("valid keyword");
        let results = adapter.search(&request).await.expect("search succeeds");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol.as_str(), "600000.SH");
    }

    #[tokio::test]
    async fn rate_limit_message_is_classified() {
        let client = Arc::new(ScriptedHttpClient::new());
        client.push_ok(
            serde_json::json!({
                "code": -1,
                "msg": "抱歉，您每分钟最多访问该接口1次",
                "data": null
            })
            .to_string(),
        );
        let adapter = adapter_with(client);

        let error = adapter.stock_list().await.expect_err("rate limited");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert!(error.retryable());
    }

    #[tokio::test]
    async fn empty_frame_is_a_distinct_failure() {
        let client = Arc::new(ScriptedHttpClient::new());
        client.push_ok(
            serde_json::json!({
                "code": 0,
                "data": {"fields": ["ts_code"], "items": []}
            })
            .to_string(),
        );
        let adapter = adapter_with(client);

        let error = adapter.stock_list().await.expect_err("empty frame");
        assert_eq!(error.kind(), SourceErrorKind::Empty);
    }

    #[tokio::test]
    async fn history_reverses_to_ascending_and_reformats_dates() {
        let client = Arc::new(ScriptedHttpClient::new());
        client.push_ok(
            serde_json::json!({
                "code": 0,
                "data": {
                    "fields": ["trade_date", "open", "high", "low", "close", "vol", "amount"],
                    "items": [
                        ["20240103", 10.2, 10.6, 10.0, 10.5, 120345, 1260000.0],
                        ["20240102", 10.0, 10.3, 9.9, 10.2, 110200, null]
                    ]
                }
            })
            .to_string(),
        );
        let adapter = adapter_with(client);

        let request = HistoryRequest::new(Symbol::normalize("600000"), Period::Daily, 180)
            .expect("valid request");
        let bars = adapter.history(&request).await.expect("history decodes");

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, "2024-01-02");
        assert_eq!(bars[0].amount, 0.0);
        assert_eq!(bars[1].date, "2024-01-03");
        assert_eq!(bars[1].close, 10.5);
    }

    #[tokio::test]
    async fn quote_endpoint_is_unsupported() {
        let client = Arc::new(ScriptedHttpClient::new());
        let adapter = adapter_with(client);
        let request = crate::QuoteRequest::new(Symbol::normalize("600000"));

        let error = adapter.quote(&request).await.expect_err("unsupported");
        assert_eq!(error.kind(), SourceErrorKind::UnsupportedEndpoint);
    }
}
