use crate::error::Result;
use crate::map::PageMapStore;
use crate::result::{ApiRecord, PageInfo, PageRecord};
use crate::source::{BodyRetriever, CaptureSource, PageInspector};
use devcurl_core::har::Exchange;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Progress of a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Started,
    AwaitingBodies { pending: usize },
    Joined,
    Persisted,
}

pub type ProgressCallback = Arc<dyn Fn(ScanPhase) + Send + Sync>;

/// Outcome of a scan: the stored page record and the exchanges it was built from
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub page: PageRecord,
    /// Programmatic exchanges, in the same order as `page.apis`
    pub exchanges: Vec<Exchange>,
}

/// Builds a page record from the API calls captured while a page was open.
///
/// Response bodies are retrieved concurrently, one task per exchange, each
/// bounded by the retrieval timeout. A body that cannot be retrieved in time
/// leaves that call's response schema empty without failing the scan.
pub struct Scanner<C, P, R> {
    capture: C,
    inspector: P,
    retriever: Arc<R>,
    timeout: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl<C, P, R> Scanner<C, P, R>
where
    C: CaptureSource,
    P: PageInspector,
    R: BodyRetriever,
{
    pub fn new(capture: C, inspector: P, retriever: R) -> Self {
        Self {
            capture,
            inspector,
            retriever: Arc::new(retriever),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            progress_callback: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report(&self, phase: ScanPhase) {
        debug!("Scan phase: {:?}", phase);
        if let Some(ref callback) = self.progress_callback {
            callback(phase);
        }
    }

    /// Scan the page and store the resulting record in `store`
    pub async fn scan(&self, store: &PageMapStore) -> Result<ScanReport> {
        self.report(ScanPhase::Started);

        let exchanges: Vec<Exchange> = match self.capture.entries().await {
            Some(entries) => entries.into_iter().filter(Exchange::is_programmatic).collect(),
            None => {
                warn!("Capture source unavailable, scanning without API calls");
                Vec::new()
            }
        };

        self.report(ScanPhase::AwaitingBodies {
            pending: exchanges.len(),
        });
        let apis = self.collect_apis(&exchanges).await;
        self.report(ScanPhase::Joined);

        let info = match self.inspector.page_info().await {
            Some(info) => info,
            None => {
                warn!("Page detection unavailable, using URL-only identity");
                PageInfo::unknown()
            }
        };
        let links = self.inspector.links().await;

        let page = PageRecord::new(info, apis, links);
        info!(
            "Scanned {} ({}): {} API calls, {} links",
            page.url,
            page.framework,
            page.apis.len(),
            page.links.len()
        );

        store.upsert(page.clone())?;
        self.report(ScanPhase::Persisted);

        Ok(ScanReport { page, exchanges })
    }

    /// One retrieval task per exchange, joined in discovery order
    async fn collect_apis(&self, exchanges: &[Exchange]) -> Vec<ApiRecord> {
        if exchanges.is_empty() {
            return Vec::new();
        }

        let handles: Vec<_> = exchanges
            .iter()
            .cloned()
            .map(|exchange| {
                let retriever = self.retriever.clone();
                let limit = self.timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(limit, retriever.retrieve(&exchange)).await {
                        Ok(body) => body,
                        Err(_) => {
                            warn!(
                                "Body retrieval for {} timed out after {:?}",
                                exchange.request.url, limit
                            );
                            None
                        }
                    }
                })
            })
            .collect();

        let bodies = join_all(handles).await;

        exchanges
            .iter()
            .zip(bodies)
            .map(|(exchange, body)| {
                let body = body.unwrap_or_else(|e| {
                    warn!("Body retrieval task for {} failed: {}", exchange.request.url, e);
                    None
                });
                ApiRecord::from_exchange(exchange, body.as_deref())
            })
            .collect()
    }
}
