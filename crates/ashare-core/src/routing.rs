use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::data_source::{
    DataSource, Endpoint, HistoryRequest, NewsRequest, QuoteRequest, SearchRequest, SourceError,
};
use crate::{HistoryBar, NewsItem, ProviderId, Quote, StockListing};

/// Chain event surfaced to the caller while tiers are being tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    TierStart {
        provider: ProviderId,
        endpoint: Endpoint,
    },
    TierFailed {
        provider: ProviderId,
        endpoint: Endpoint,
        code: &'static str,
        message: String,
    },
}

/// Receiver for chain progress. The CLI renders these as diagnostic
/// lines; library callers usually pass [`NullSink`].
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// One failed tier, kept for the exhausted-chain report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFailure {
    pub provider: ProviderId,
    pub code: &'static str,
    pub message: String,
}

impl Display for ChainFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.provider, self.message, self.code)
    }
}

fn summarize(failures: &[ChainFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal chain error: either every tier failed or the deadline fired.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("all sources failed for '{endpoint}': {}", summarize(.failures))]
    Exhausted {
        endpoint: Endpoint,
        failures: Vec<ChainFailure>,
    },

    #[error("'{endpoint}' timed out after {timeout_secs}s")]
    Timeout { endpoint: Endpoint, timeout_secs: u64 },
}

/// Successful chain result plus the tier that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome<T> {
    pub value: T,
    pub source: ProviderId,
}

type TierFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Ordered fallback over the registered sources. Tiers are tried in a
/// per-endpoint order; a tier that fails or answers with nothing is
/// recorded and the next tier takes over. The whole walk runs under a
/// single deadline, so a stalled upstream cannot hold the process.
pub struct FallbackChain {
    sources: Vec<Arc<dyn DataSource>>,
    timeout: Duration,
    sink: Arc<dyn ProgressSink>,
}

impl FallbackChain {
    pub fn new(sources: Vec<Arc<dyn DataSource>>, timeout: Duration) -> Self {
        Self {
            sources,
            timeout,
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Tier order per endpoint. Bulk catalog endpoints lead with the
    /// columnar provider and end on the built-in catalog; market-data
    /// endpoints lead with the spot provider. The connectivity probe
    /// never reaches the catalog, which would vacuously succeed.
    fn plan(&self, endpoint: Endpoint) -> Vec<&Arc<dyn DataSource>> {
        let order: &[ProviderId] = match endpoint {
            Endpoint::StockList | Endpoint::Search => &[
                ProviderId::Tushare,
                ProviderId::Eastmoney,
                ProviderId::Static,
            ],
            Endpoint::Test => &[ProviderId::Eastmoney, ProviderId::Tushare],
            Endpoint::Quote | Endpoint::History | Endpoint::News => &[
                ProviderId::Eastmoney,
                ProviderId::Tushare,
                ProviderId::Static,
            ],
        };

        order
            .iter()
            .filter_map(|id| self.sources.iter().find(|source| source.id() == *id))
            .collect()
    }

    async fn run<'a, T, F>(
        &'a self,
        endpoint: Endpoint,
        op: F,
    ) -> Result<ChainOutcome<T>, ChainError>
    where
        F: Fn(&'a dyn DataSource) -> TierFuture<'a, T>,
    {
        let walk = async {
            let mut failures = Vec::new();

            for source in self.plan(endpoint) {
                let provider = source.id();

                if !source.capabilities().supports(endpoint) {
                    failures.push(ChainFailure {
                        provider,
                        code: "source.unsupported_endpoint",
                        message: format!("endpoint '{endpoint}' is not supported"),
                    });
                    continue;
                }

                self.sink.emit(&ProgressEvent::TierStart { provider, endpoint });

                match op(source.as_ref()).await {
                    Ok(value) => return Ok(ChainOutcome { value, source: provider }),
                    Err(error) => {
                        self.sink.emit(&ProgressEvent::TierFailed {
                            provider,
                            endpoint,
                            code: error.code(),
                            message: error.message().to_owned(),
                        });
                        failures.push(ChainFailure {
                            provider,
                            code: error.code(),
                            message: error.message().to_owned(),
                        });
                    }
                }
            }

            Err(ChainError::Exhausted { endpoint, failures })
        };

        match tokio::time::timeout(self.timeout, walk).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Timeout {
                endpoint,
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    pub async fn probe(&self) -> Result<ChainOutcome<()>, ChainError> {
        self.run(Endpoint::Test, |source| Box::pin(source.probe()))
            .await
    }

    pub async fn quote(&self, req: &QuoteRequest) -> Result<ChainOutcome<Quote>, ChainError> {
        self.run(Endpoint::Quote, move |source| {
            let req = req.clone();
            Box::pin(async move { source.quote(&req).await })
        })
        .await
    }

    pub async fn history(
        &self,
        req: &HistoryRequest,
    ) -> Result<ChainOutcome<Vec<HistoryBar>>, ChainError> {
        self.run(Endpoint::History, move |source| {
            let req = req.clone();
            Box::pin(async move {
                let bars = source.history(&req).await?;
                if bars.is_empty() {
                    return Err(SourceError::empty(format!(
                        "source returned no history rows for {}",
                        req.symbol
                    )));
                }
                Ok(bars)
            })
        })
        .await
    }

    pub async fn stock_list(&self) -> Result<ChainOutcome<Vec<StockListing>>, ChainError> {
        self.run(Endpoint::StockList, |source| {
            Box::pin(async move {
                let listings = source.stock_list().await?;
                if listings.is_empty() {
                    return Err(SourceError::empty("source returned no listings"));
                }
                Ok(listings)
            })
        })
        .await
    }

    pub async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<ChainOutcome<Vec<StockListing>>, ChainError> {
        self.run(Endpoint::Search, move |source| {
            let req = req.clone();
            Box::pin(async move {
                let hits = source.search(&req).await?;
                // The catalog is the terminal tier; its empty subset is
                // the final answer, not a reason to keep walking.
                if hits.is_empty() && source.id() != ProviderId::Static {
                    return Err(SourceError::empty(format!(
                        "source returned no match for '{}'",
                        req.keyword
                    )));
                }
                Ok(hits)
            })
        })
        .await
    }

    pub async fn news(&self, req: &NewsRequest) -> Result<ChainOutcome<Vec<NewsItem>>, ChainError> {
        self.run(Endpoint::News, move |source| {
            let req = req.clone();
            Box::pin(async move {
                let items = source.news(&req).await?;
                if items.is_empty() {
                    return Err(SourceError::empty("source returned no news items"));
                }
                Ok(items)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::StaticCatalog;
    use crate::data_source::CapabilitySet;
    use crate::Symbol;

    const TEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Scripted tier: fails every call with the given error, or serves
    /// an empty listing frame when `error` is `None`.
    struct StubSource {
        id: ProviderId,
        capabilities: CapabilitySet,
        error: Option<SourceError>,
    }

    impl StubSource {
        fn failing(id: ProviderId, error: SourceError) -> Arc<Self> {
            Arc::new(Self {
                id,
                capabilities: CapabilitySet::full(),
                error: Some(error),
            })
        }

        fn empty_frames(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                capabilities: CapabilitySet::full(),
                error: None,
            })
        }
    }

    #[async_trait]
    impl DataSource for StubSource {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn capabilities(&self) -> CapabilitySet {
            self.capabilities
        }

        async fn probe(&self) -> Result<(), SourceError> {
            match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        async fn quote(&self, _req: &QuoteRequest) -> Result<Quote, SourceError> {
            Err(self
                .error
                .clone()
                .unwrap_or_else(|| SourceError::empty("no quote rows")))
        }

        async fn stock_list(&self) -> Result<Vec<StockListing>, SourceError> {
            match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(Vec::new()),
            }
        }

        async fn search(&self, _req: &SearchRequest) -> Result<Vec<StockListing>, SourceError> {
            self.stock_list().await
        }
    }

    struct SlowSource;

    #[async_trait]
    impl DataSource for SlowSource {
        fn id(&self) -> ProviderId {
            ProviderId::Eastmoney
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::full()
        }

        async fn probe(&self) -> Result<(), SourceError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_tier_in_order() {
        let chain = FallbackChain::new(
            vec![
                StubSource::failing(ProviderId::Eastmoney, SourceError::unavailable("down")),
                StubSource::failing(ProviderId::Tushare, SourceError::rate_limited("throttled")),
            ],
            TEST_TIMEOUT,
        );

        let request = QuoteRequest::new(Symbol::normalize("600000"));
        let error = chain.quote(&request).await.expect_err("all tiers fail");

        match error {
            ChainError::Exhausted { endpoint, failures } => {
                assert_eq!(endpoint, Endpoint::Quote);
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].provider, ProviderId::Eastmoney);
                assert_eq!(failures[0].code, "source.unavailable");
                assert_eq!(failures[1].provider, ProviderId::Tushare);
                assert_eq!(failures[1].code, "source.rate_limited");
            }
            other => panic!("expected exhausted error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_falls_back_to_catalog_when_providers_fail() {
        let chain = FallbackChain::new(
            vec![
                StubSource::failing(ProviderId::Tushare, SourceError::unavailable("down")),
                StubSource::failing(ProviderId::Eastmoney, SourceError::unavailable("down")),
                Arc::new(StaticCatalog::new()),
            ],
            TEST_TIMEOUT,
        );

        let request = SearchRequest::new("茅台").expect("valid keyword");
        let outcome = chain.search(&request).await.expect("catalog answers");

        assert_eq!(outcome.source, ProviderId::Static);
        assert_eq!(outcome.value[0].symbol.as_str(), "600519.SH");
    }

    #[tokio::test]
    async fn search_with_no_match_anywhere_succeeds_with_empty_subset() {
        let chain = FallbackChain::new(
            vec![
                StubSource::empty_frames(ProviderId::Tushare),
                StubSource::empty_frames(ProviderId::Eastmoney),
                Arc::new(StaticCatalog::new()),
            ],
            TEST_TIMEOUT,
        );

        let request = SearchRequest::new("没有这家公司").expect("valid keyword");
        let outcome = chain.search(&request).await.expect("catalog closes the walk");

        assert_eq!(outcome.source, ProviderId::Static);
        assert!(outcome.value.is_empty());
    }

    #[tokio::test]
    async fn empty_frames_advance_the_chain_like_failures() {
        let chain = FallbackChain::new(
            vec![
                StubSource::empty_frames(ProviderId::Tushare),
                StubSource::empty_frames(ProviderId::Eastmoney),
                Arc::new(StaticCatalog::new()),
            ],
            TEST_TIMEOUT,
        );

        let outcome = chain.stock_list().await.expect("catalog answers");
        assert_eq!(outcome.source, ProviderId::Static);
        assert_eq!(outcome.value.len(), 20);
    }

    #[tokio::test]
    async fn progress_sink_sees_tier_starts_and_failures() {
        let sink = Arc::new(RecordingSink::default());
        let chain = FallbackChain::new(
            vec![
                StubSource::failing(ProviderId::Eastmoney, SourceError::unavailable("down")),
                StubSource::empty_frames(ProviderId::Tushare),
            ],
            TEST_TIMEOUT,
        )
        .with_sink(sink.clone());

        chain.probe().await.expect("second tier answers");

        let events = sink.events.lock().unwrap();
        assert_eq!(
            events[0],
            ProgressEvent::TierStart {
                provider: ProviderId::Eastmoney,
                endpoint: Endpoint::Test,
            }
        );
        assert!(matches!(
            events[1],
            ProgressEvent::TierFailed {
                provider: ProviderId::Eastmoney,
                code: "source.unavailable",
                ..
            }
        ));
        assert_eq!(
            events[2],
            ProgressEvent::TierStart {
                provider: ProviderId::Tushare,
                endpoint: Endpoint::Test,
            }
        );
    }

    #[tokio::test]
    async fn probe_plan_skips_the_catalog() {
        let chain = FallbackChain::new(
            vec![
                StubSource::failing(ProviderId::Eastmoney, SourceError::unavailable("down")),
                StubSource::failing(ProviderId::Tushare, SourceError::unavailable("down")),
                Arc::new(StaticCatalog::new()),
            ],
            TEST_TIMEOUT,
        );

        let error = chain.probe().await.expect_err("catalog must not answer");
        match error {
            ChainError::Exhausted { failures, .. } => {
                assert_eq!(failures.len(), 2);
                assert!(failures
                    .iter()
                    .all(|failure| failure.provider != ProviderId::Static));
            }
            other => panic!("expected exhausted error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_a_stalled_tier() {
        let chain = FallbackChain::new(vec![Arc::new(SlowSource)], Duration::from_secs(30));

        let error = chain.probe().await.expect_err("deadline fires");
        match error {
            ChainError::Timeout { endpoint, timeout_secs } => {
                assert_eq!(endpoint, Endpoint::Test);
                assert_eq!(timeout_secs, 30);
            }
            other => panic!("expected timeout error, got {other:?}"),
        }
    }
}
