//! Core contracts for ashare.
//!
//! This crate contains:
//! - Canonical domain models and symbol normalization
//! - Provider identifiers and the result envelope
//! - Data source trait, provider adapters and the fallback chain
//! - HTTP transport abstraction and environment configuration

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod routing;
pub mod source;

pub use adapters::{EastmoneyAdapter, StaticCatalog, TushareAdapter};
pub use config::ProviderConfig;
pub use data_source::{
    CapabilitySet, DataSource, Endpoint, HistoryRequest, NewsRequest, QuoteRequest, SearchRequest,
    SourceError, SourceErrorKind,
};
pub use domain::{
    Exchange, HistoryBar, NewsItem, Period, Quote, StockBasicRow, StockListing, Symbol,
};
pub use envelope::Outcome;
pub use error::ValidationError;
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use routing::{
    ChainError, ChainFailure, ChainOutcome, FallbackChain, NullSink, ProgressEvent, ProgressSink,
};
pub use source::ProviderId;
