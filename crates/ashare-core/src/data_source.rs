use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{HistoryBar, NewsItem, Period, ProviderId, Quote, StockListing, Symbol};

/// Operation type used for chain planning and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    Test,
    StockList,
    Quote,
    History,
    Search,
    News,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::StockList => "stock-list",
            Self::Quote => "quote",
            Self::History => "history",
            Self::Search => "search",
            Self::News => "news",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    pub quote: bool,
    pub history: bool,
    pub list: bool,
    pub search: bool,
    pub news: bool,
}

impl CapabilitySet {
    pub const fn new(quote: bool, history: bool, list: bool, search: bool, news: bool) -> Self {
        Self {
            quote,
            history,
            list,
            search,
            news,
        }
    }

    pub const fn full() -> Self {
        Self::new(true, true, true, true, true)
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Test => true,
            Endpoint::Quote => self.quote,
            Endpoint::History => self.history,
            Endpoint::StockList => self.list,
            Endpoint::Search => self.search,
            Endpoint::News => self.news,
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Provider answered but the frame carried no rows.
    Empty,
    Unavailable,
    RateLimited,
    InvalidRequest,
    UnsupportedEndpoint,
    Internal,
}

/// Structured source error driving the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Empty,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unsupported_endpoint(provider: ProviderId, endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by source '{provider}'"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Empty => "source.empty",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for the quote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbol: Symbol,
}

impl QuoteRequest {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

/// Request payload for the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub period: Period,
    pub count: usize,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, period: Period, count: usize) -> Result<Self, SourceError> {
        if count == 0 {
            return Err(SourceError::invalid_request(
                "history count must be greater than zero",
            ));
        }
        Ok(Self {
            symbol,
            period,
            count,
        })
    }
}

/// Request payload for the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: String,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>) -> Result<Self, SourceError> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "search keyword must not be empty",
            ));
        }
        Ok(Self { keyword })
    }
}

/// Request payload for the news endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRequest {
    pub count: usize,
}

impl NewsRequest {
    pub fn new(count: usize) -> Result<Self, SourceError> {
        if count == 0 {
            return Err(SourceError::invalid_request(
                "news count must be greater than zero",
            ));
        }
        Ok(Self { count })
    }
}

/// Source adapter contract. Endpoints a provider cannot serve keep the
/// default body and fail fast with an unsupported-endpoint error.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn id(&self) -> ProviderId;
    fn capabilities(&self) -> CapabilitySet;

    /// Cheap connectivity probe used by the `test` action.
    async fn probe(&self) -> Result<(), SourceError>;

    async fn quote(&self, _req: &QuoteRequest) -> Result<Quote, SourceError> {
        Err(SourceError::unsupported_endpoint(self.id(), Endpoint::Quote))
    }

    async fn history(&self, _req: &HistoryRequest) -> Result<Vec<HistoryBar>, SourceError> {
        Err(SourceError::unsupported_endpoint(
            self.id(),
            Endpoint::History,
        ))
    }

    async fn stock_list(&self) -> Result<Vec<StockListing>, SourceError> {
        Err(SourceError::unsupported_endpoint(
            self.id(),
            Endpoint::StockList,
        ))
    }

    async fn search(&self, _req: &SearchRequest) -> Result<Vec<StockListing>, SourceError> {
        Err(SourceError::unsupported_endpoint(
            self.id(),
            Endpoint::Search,
        ))
    }

    async fn news(&self, _req: &NewsRequest) -> Result<Vec<NewsItem>, SourceError> {
        Err(SourceError::unsupported_endpoint(self.id(), Endpoint::News))
    }
}
