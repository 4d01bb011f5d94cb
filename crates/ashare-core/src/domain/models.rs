use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProviderId, Symbol, ValidationError};

/// History bar aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ValidationError::UnsupportedPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Point-in-time quote snapshot in the fixed output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub name: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub pre_close: f64,
    pub volume: i64,
    pub amount: f64,
    pub change: f64,
    pub pct_chg: f64,
    pub date: String,
    pub time: String,
    pub source: ProviderId,
}

/// One OHLCV record in the fixed output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub amount: f64,
}

/// Stock listing entry: canonical symbol plus derived market label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockListing {
    pub symbol: Symbol,
    pub name: String,
    pub market: String,
    pub industry: String,
}

impl StockListing {
    /// Build a listing from provider columns; the market label derives from
    /// the symbol's exchange and a missing industry becomes `未知`.
    pub fn from_columns(symbol: Symbol, name: impl Into<String>, industry: Option<String>) -> Self {
        let market = symbol.market_label().to_owned();
        Self {
            symbol,
            name: name.into(),
            market,
            industry: industry.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| "未知".to_owned()),
        }
    }

    /// Case-insensitive substring match on symbol or name.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.symbol.as_str().to_lowercase().contains(&keyword)
            || self.name.to_lowercase().contains(&keyword)
    }
}

/// Title keywords that mark a news item as important.
const IMPORTANT_KEYWORDS: [&str; 6] = ["重要", "突发", "紧急", "央行", "国常会", "政策"];

/// Financial news entry. Providers never return article bodies, so
/// `content` is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub time: String,
    pub source: String,
    pub url: String,
    pub important: bool,
    pub content: String,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        time: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let important = Self::is_important(&title);
        Self {
            title,
            time: time.into(),
            source: source.into(),
            url: url.into(),
            important,
            content: String::new(),
        }
    }

    fn is_important(title: &str) -> bool {
        IMPORTANT_KEYWORDS
            .iter()
            .any(|keyword| title.contains(keyword))
    }
}

/// Full `stock_basic` row as persisted to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBasicRow {
    pub ts_code: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub cnspell: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub list_date: String,
    #[serde(default)]
    pub act_name: String,
    #[serde(default)]
    pub act_ent_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parses_known_values_only() {
        assert_eq!("daily".parse::<Period>(), Ok(Period::Daily));
        assert_eq!("weekly".parse::<Period>(), Ok(Period::Weekly));
        assert_eq!("monthly".parse::<Period>(), Ok(Period::Monthly));

        let err = "hourly".parse::<Period>().expect_err("must fail");
        assert!(matches!(err, ValidationError::UnsupportedPeriod { .. }));
    }

    #[test]
    fn listing_defaults_missing_industry() {
        let listing = StockListing::from_columns(Symbol::normalize("600000"), "浦发银行", None);
        assert_eq!(listing.industry, "未知");
        assert_eq!(listing.market, "上海");
    }

    #[test]
    fn listing_matches_code_and_name_case_insensitively() {
        let listing = StockListing::from_columns(
            Symbol::normalize("000001"),
            "平安银行",
            Some("银行".to_owned()),
        );
        assert!(listing.matches("000001"));
        assert!(listing.matches("平安"));
        assert!(listing.matches("000001.sz"));
        assert!(!listing.matches("茅台"));
    }

    #[test]
    fn news_importance_follows_title_keywords() {
        let important = NewsItem::new("央行宣布降准", "2024-05-01 09:00:00", "东方财富网", "");
        assert!(important.important);

        let ordinary = NewsItem::new("某公司发布年报", "2024-05-01 09:00:00", "东方财富网", "");
        assert!(!ordinary.important);
        assert!(ordinary.content.is_empty());
    }
}
