use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use time::macros::{format_description, offset};
use time::OffsetDateTime;

use crate::data_source::{
    CapabilitySet, DataSource, HistoryRequest, NewsRequest, QuoteRequest, SearchRequest,
    SourceError,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{Exchange, HistoryBar, NewsItem, Period, ProviderId, Quote, StockListing, Symbol};

use super::{num_f64, num_i64, opt_str};

const SPOT_URL: &str = "http://push2.eastmoney.com/api/qt/clist/get";
const KLINE_URL: &str = "http://push2his.eastmoney.com/api/qt/stock/kline/get";
const NEWS_URL: &str = "https://np-listapi.eastmoney.com/comm/web/getFastNewsList";

/// A-share universe filter for the clist endpoint (SH/SZ/BJ boards).
const SPOT_FS: &str = "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23,m:0+t:81+s:2048";

/// Columns requested from the spot frame. `f`-numbered keys map to the
/// fixed schema: f2 price, f3 pct_chg, f4 change, f5 volume, f6 amount,
/// f12 code, f14 name, f15 high, f16 low, f17 open, f18 pre_close,
/// f100 industry.
const SPOT_FIELDS: &str = "f2,f3,f4,f5,f6,f12,f14,f15,f16,f17,f18,f100";

const NEWS_SOURCE_LABEL: &str = "东方财富网";

/// Eastmoney push2 adapter. The only source that serves every endpoint.
pub struct EastmoneyAdapter {
    http: Arc<dyn HttpClient>,
}

impl EastmoneyAdapter {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    async fn fetch_json(&self, url: String) -> Result<String, SourceError> {
        let response = self
            .http
            .execute(HttpRequest::get(url))
            .await
            .map_err(|error| {
                SourceError::unavailable(format!(
                    "eastmoney transport error: {}",
                    error.message()
                ))
            })?;

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "eastmoney returned status {}",
                response.status
            )));
        }

        Ok(response.body)
    }

    async fn spot_rows(&self, page_size: usize) -> Result<Vec<Map<String, Value>>, SourceError> {
        let url = format!(
            "{SPOT_URL}?pn=1&pz={page_size}&po=1&np=1&fltt=2&invt=2&fid=f3&fs={}&fields={SPOT_FIELDS}",
            urlencoding::encode(SPOT_FS)
        );
        let body = self.fetch_json(url).await?;

        let parsed: ClistResponse = serde_json::from_str(&body).map_err(|error| {
            SourceError::internal(format!("failed to parse eastmoney spot frame: {error}"))
        })?;

        let rows = parsed.data.map(|data| data.diff).unwrap_or_default();
        if rows.is_empty() {
            return Err(SourceError::empty("eastmoney spot frame carried no rows"));
        }

        Ok(rows)
    }

    fn row_to_listing(row: &Map<String, Value>) -> Result<StockListing, SourceError> {
        let code = opt_str(row.get("f12"))
            .ok_or_else(|| SourceError::internal("eastmoney row is missing code column f12"))?;
        let name = opt_str(row.get("f14"))
            .ok_or_else(|| SourceError::internal("eastmoney row is missing name column f14"))?;
        let industry = opt_str(row.get("f100"));

        Ok(StockListing::from_columns(
            Symbol::normalize(&code),
            name,
            industry,
        ))
    }
}

#[async_trait]
impl DataSource for EastmoneyAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Eastmoney
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::full()
    }

    async fn probe(&self) -> Result<(), SourceError> {
        self.spot_rows(5).await.map(|_| ())
    }

    async fn quote(&self, req: &QuoteRequest) -> Result<Quote, SourceError> {
        let rows = self.spot_rows(6000).await?;
        let code = req.symbol.code();

        let row = rows
            .iter()
            .find(|row| opt_str(row.get("f12")).as_deref() == Some(code))
            .ok_or_else(|| {
                SourceError::empty(format!("no quote row found for symbol {}", req.symbol))
            })?;

        let cell = |key: &str, field: &'static str| -> Result<&Value, SourceError> {
            row.get(key).ok_or_else(|| {
                SourceError::internal(format!("eastmoney row is missing column {key} ({field})"))
            })
        };

        let (date, time) = now_stamp();
        Ok(Quote {
            name: opt_str(row.get("f14")).unwrap_or_else(|| req.symbol.as_str().to_owned()),
            price: num_f64(cell("f2", "price")?, "price")?,
            open: num_f64(cell("f17", "open")?, "open")?,
            high: num_f64(cell("f15", "high")?, "high")?,
            low: num_f64(cell("f16", "low")?, "low")?,
            pre_close: num_f64(cell("f18", "pre_close")?, "pre_close")?,
            volume: num_i64(cell("f5", "volume")?, "volume")?,
            amount: num_f64(cell("f6", "amount")?, "amount")?,
            change: num_f64(cell("f4", "change")?, "change")?,
            pct_chg: num_f64(cell("f3", "pct_chg")?, "pct_chg")?,
            date,
            time,
            source: ProviderId::Eastmoney,
        })
    }

    async fn history(&self, req: &HistoryRequest) -> Result<Vec<HistoryBar>, SourceError> {
        let klt = match req.period {
            Period::Daily => 101,
            Period::Weekly => 102,
            Period::Monthly => 103,
        };
        let market = match req.symbol.exchange() {
            Some(Exchange::Sh) => 1,
            _ => 0,
        };

        let url = format!(
            "{KLINE_URL}?secid={market}.{}&klt={klt}&fqt=0&beg=0&end=20500101&lmt={}\
             &fields1=f1,f2,f3,f4,f5,f6&fields2=f51,f52,f53,f54,f55,f56,f57",
            req.symbol.code(),
            req.count
        );
        let body = self.fetch_json(url).await?;

        let parsed: KlineResponse = serde_json::from_str(&body).map_err(|error| {
            SourceError::internal(format!("failed to parse eastmoney kline frame: {error}"))
        })?;

        let klines = parsed.data.map(|data| data.klines).unwrap_or_default();
        if klines.is_empty() {
            return Err(SourceError::empty(format!(
                "eastmoney returned no kline rows for {}",
                req.symbol
            )));
        }

        klines.iter().map(|line| parse_kline(line)).collect()
    }

    async fn stock_list(&self) -> Result<Vec<StockListing>, SourceError> {
        let rows = self.spot_rows(6000).await?;
        rows.iter().map(Self::row_to_listing).collect()
    }

    async fn search(&self, req: &SearchRequest) -> Result<Vec<StockListing>, SourceError> {
        let listings = self.stock_list().await?;
        Ok(listings
            .into_iter()
            .filter(|listing| listing.matches(&req.keyword))
            .collect())
    }

    async fn news(&self, req: &NewsRequest) -> Result<Vec<NewsItem>, SourceError> {
        let url = format!(
            "{NEWS_URL}?client=web&biz=web_724&fastColumn=102&sortEnd=&pageSize={}&req_trace=",
            req.count
        );
        let body = self.fetch_json(url).await?;

        let parsed: FastNewsResponse = serde_json::from_str(&body).map_err(|error| {
            SourceError::internal(format!("failed to parse eastmoney news feed: {error}"))
        })?;

        let items = parsed
            .data
            .map(|data| data.fast_news_list)
            .unwrap_or_default();
        if items.is_empty() {
            return Err(SourceError::empty("eastmoney news feed carried no items"));
        }

        Ok(items
            .into_iter()
            .take(req.count)
            .map(|item| {
                NewsItem::new(
                    item.title,
                    item.show_time,
                    NEWS_SOURCE_LABEL,
                    item.url_w.unwrap_or_default(),
                )
            })
            .collect())
    }
}

/// Packed kline row: `date,open,close,high,low,volume,amount`.
fn parse_kline(line: &str) -> Result<HistoryBar, SourceError> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 7 {
        return Err(SourceError::internal(format!(
            "eastmoney kline row has {} columns, expected 7",
            parts.len()
        )));
    }

    let field = |index: usize, name: &'static str| -> Result<f64, SourceError> {
        num_f64(&Value::String(parts[index].to_owned()), name)
    };

    Ok(HistoryBar {
        date: parts[0].to_owned(),
        open: field(1, "open")?,
        close: field(2, "close")?,
        high: field(3, "high")?,
        low: field(4, "low")?,
        volume: num_i64(&Value::String(parts[5].to_owned()), "volume")?,
        amount: field(6, "amount")?,
    })
}

/// Wall-clock stamp in the exchange timezone (UTC+8).
fn now_stamp() -> (String, String) {
    let now = OffsetDateTime::now_utc().to_offset(offset!(+8));
    let date_format = format_description!("[year]-[month]-[day]");
    let time_format = format_description!("[hour]:[minute]:[second]");

    (
        now.format(&date_format)
            .unwrap_or_else(|_| String::from("1970-01-01")),
        now.format(&time_format)
            .unwrap_or_else(|_| String::from("00:00:00")),
    )
}

#[derive(Debug, Deserialize)]
struct ClistResponse {
    #[serde(default)]
    data: Option<ClistData>,
}

#[derive(Debug, Deserialize)]
struct ClistData {
    #[serde(default)]
    diff: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    #[serde(default)]
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FastNewsResponse {
    #[serde(default)]
    data: Option<FastNewsData>,
}

#[derive(Debug, Deserialize)]
struct FastNewsData {
    #[serde(rename = "fastNewsList", default)]
    fast_news_list: Vec<FastNewsItem>,
}

#[derive(Debug, Deserialize)]
struct FastNewsItem {
    #[serde(default)]
    title: String,
    #[serde(rename = "showTime", default)]
    show_time: String,
    #[serde(rename = "url_w", default)]
    url_w: Option<String>,
}
