// Collaborators a scan draws on: captured exchanges, the inspected page, and response bodies

use crate::error::{Result, ScanError};
use crate::result::PageInfo;
use devcurl_core::har::{Exchange, Har, path_with_query};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

const SUBSCRIBER_CAPACITY: usize = 256;

/// Source of captured exchanges
pub trait CaptureSource: Send + Sync {
    /// Exchanges captured so far, or `None` when capture is unavailable
    fn entries(&self) -> impl Future<Output = Option<Vec<Exchange>>> + Send;

    /// Receive exchanges as they finish
    fn subscribe(&self) -> Option<broadcast::Receiver<Exchange>>;
}

/// Identity and outgoing links of the inspected page
pub trait PageInspector: Send + Sync {
    /// `None` when the page cannot be inspected
    fn page_info(&self) -> impl Future<Output = Option<PageInfo>> + Send;

    /// Same-origin link paths, de-duplicated
    fn links(&self) -> impl Future<Output = Vec<String>> + Send;
}

/// Fetches the response body of an exchange
pub trait BodyRetriever: Send + Sync + 'static {
    /// Body text, or `None` when it cannot be obtained
    fn retrieve(&self, exchange: &Exchange) -> impl Future<Output = Option<String>> + Send;
}

impl<T: CaptureSource> CaptureSource for Option<T> {
    async fn entries(&self) -> Option<Vec<Exchange>> {
        match self {
            Some(source) => source.entries().await,
            None => None,
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<Exchange>> {
        self.as_ref().and_then(|source| source.subscribe())
    }
}

impl<T: PageInspector> PageInspector for Option<T> {
    async fn page_info(&self) -> Option<PageInfo> {
        match self {
            Some(inspector) => inspector.page_info().await,
            None => None,
        }
    }

    async fn links(&self) -> Vec<String> {
        match self {
            Some(inspector) => inspector.links().await,
            None => Vec::new(),
        }
    }
}

// ============================================================================
// Capture
// ============================================================================

/// In-process capture log. Recorded exchanges are kept in arrival order and
/// broadcast to subscribers.
pub struct CaptureLog {
    entries: Mutex<Vec<Exchange>>,
    sender: broadcast::Sender<Exchange>,
}

impl CaptureLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            entries: Mutex::new(Vec::new()),
            sender,
        }
    }

    /// Log of the exchanges a HAR capture recorded on the page at `page_url`
    /// (the first page when `None`)
    pub fn from_har(har: &Har, page_url: Option<&str>) -> Self {
        let pageref = har.page_ref(page_url);
        if let Some(pageref) = pageref {
            debug!("Scoping capture to page {}", pageref);
        }
        let log = Self::new();
        for exchange in har.page_entries(pageref) {
            log.record(exchange);
        }
        log
    }

    /// Append a finished exchange and notify subscribers
    pub fn record(&self, exchange: Exchange) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(exchange.clone()),
            Err(_) => {
                warn!("Capture log lock poisoned, dropping {}", exchange.request.url);
                return;
            }
        }
        // No receivers is not an error
        let _ = self.sender.send(exchange);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for CaptureLog {
    async fn entries(&self) -> Option<Vec<Exchange>> {
        self.entries.lock().ok().map(|entries| entries.clone())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<Exchange>> {
        Some(self.sender.subscribe())
    }
}

// ============================================================================
// Page inspection
// ============================================================================

/// Inspects a page from its URL and, when available, its captured HTML.
///
/// A `__NEXT_DATA__` script marks the page as Next.js and supplies the route
/// (`page`) and params (`query`).
pub struct HtmlPageInspector {
    page_url: Url,
    html: Option<String>,
}

impl HtmlPageInspector {
    pub fn new(page_url: &str, html: Option<String>) -> Result<Self> {
        let page_url = Url::parse(page_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", page_url, e)))?;
        Ok(Self { page_url, html })
    }

    /// Inspector for a page in a HAR capture.
    ///
    /// With `page_url` the matching document entry supplies the HTML; without it
    /// the first document entry is used, then the first page title. Returns `None`
    /// when no page can be identified.
    pub fn from_har(har: &Har, page_url: Option<&str>) -> Option<Self> {
        let document = har.document(page_url);
        let url = har.page_url(page_url)?;
        let html = document.and_then(|d| d.response.content.text.clone());

        match Self::new(url, html) {
            Ok(inspector) => Some(inspector),
            Err(e) => {
                warn!("Cannot inspect page: {}", e);
                None
            }
        }
    }

    fn url(&self) -> String {
        path_with_query(self.page_url.as_str())
    }

    fn next_data(document: &Html) -> Option<Value> {
        let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
        let script = document.select(&selector).next()?;
        let text: String = script.text().collect();
        match serde_json::from_str(&text) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("Unreadable __NEXT_DATA__: {}", e);
                None
            }
        }
    }

    fn extract_links(&self, document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let origin = self.page_url.origin();
        let own_path = self.page_url.path();
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.is_empty() {
                continue;
            }
            let Ok(resolved) = self.page_url.join(href) else {
                continue;
            };
            if resolved.origin() != origin {
                continue;
            }

            let path = resolved.path();
            if path != own_path && seen.insert(path.to_string()) {
                debug!("Found link: {}", path);
                links.push(path.to_string());
            }
        }

        links
    }
}

impl PageInspector for HtmlPageInspector {
    async fn page_info(&self) -> Option<PageInfo> {
        let mut info = PageInfo::url_only(self.url());

        if let Some(html) = &self.html
            && let Some(data) = Self::next_data(&Html::parse_document(html))
        {
            info.framework = "nextjs".to_string();
            info.route = data.get("page").and_then(Value::as_str).map(str::to_string);
            info.params = data.get("query").filter(|q| !q.is_null()).cloned();
        }

        Some(info)
    }

    async fn links(&self) -> Vec<String> {
        match &self.html {
            Some(html) => self.extract_links(&Html::parse_document(html)),
            None => Vec::new(),
        }
    }
}

// ============================================================================
// Body retrieval
// ============================================================================

/// Reads the body stored in the capture itself
#[derive(Debug, Clone, Default)]
pub struct HarContentRetriever;

impl BodyRetriever for HarContentRetriever {
    async fn retrieve(&self, exchange: &Exchange) -> Option<String> {
        exchange
            .response
            .content
            .text
            .clone()
            .filter(|text| !text.is_empty())
    }
}

/// Replays GET requests to fetch a fresh body. Other methods are never replayed.
#[derive(Debug, Clone)]
pub struct RefetchRetriever {
    client: Client,
}

impl RefetchRetriever {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("devcurl/0.2 (https://github.com/trapdoorsec/devcurl)")
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScanError::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl BodyRetriever for RefetchRetriever {
    async fn retrieve(&self, exchange: &Exchange) -> Option<String> {
        if exchange.method() != "GET" {
            return None;
        }

        let url = &exchange.request.url;
        debug!("Refetching {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Refetch of {} failed: {}", url, e);
                return None;
            }
        };

        match response.text().await {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                debug!("Reading body of {} failed: {}", url, e);
                None
            }
        }
    }
}

/// Tries `first`, then `second` when the first yields nothing
#[derive(Debug, Clone)]
pub struct ChainRetriever<A, B> {
    first: A,
    second: B,
}

impl<A, B> ChainRetriever<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: BodyRetriever, B: BodyRetriever> BodyRetriever for ChainRetriever<A, B> {
    async fn retrieve(&self, exchange: &Exchange) -> Option<String> {
        match self.first.retrieve(exchange).await {
            Some(body) => Some(body),
            None => self.second.retrieve(exchange).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_PAGE: &str = r#"<html><body>
        <a href="/users/5">Ann</a>
        <a href="/users/5?tab=posts">Ann's posts</a>
        <a href="https://app.example.com/settings#top">Settings</a>
        <a href="https://other.example.com/away">Away</a>
        <a href="/users">Self</a>
        <a href="">Empty</a>
        <script id="__NEXT_DATA__" type="application/json">
            {"page":"/users","query":{"sort":"name"},"buildId":"x"}
        </script>
    </body></html>"#;

    #[tokio::test]
    async fn test_nextjs_page_info() {
        let inspector =
            HtmlPageInspector::new("https://app.example.com/users?sort=name", Some(NEXT_PAGE.into()))
                .unwrap();
        let info = inspector.page_info().await.unwrap();
        assert_eq!(info.url, "/users?sort=name");
        assert_eq!(info.framework, "nextjs");
        assert_eq!(info.route.as_deref(), Some("/users"));
        assert_eq!(info.params, Some(serde_json::json!({"sort": "name"})));
    }

    #[tokio::test]
    async fn test_links_are_same_origin_unique_paths() {
        let inspector =
            HtmlPageInspector::new("https://app.example.com/users", Some(NEXT_PAGE.into())).unwrap();
        assert_eq!(inspector.links().await, vec!["/users/5", "/settings"]);
    }

    #[tokio::test]
    async fn test_plain_page_is_url_only() {
        let inspector = HtmlPageInspector::new(
            "https://app.example.com/about",
            Some("<p>No framework</p>".into()),
        )
        .unwrap();
        let info = inspector.page_info().await.unwrap();
        assert_eq!(info, PageInfo::url_only("/about"));
        assert!(inspector.links().await.is_empty());
    }

    #[test]
    fn test_invalid_page_url() {
        assert!(matches!(
            HtmlPageInspector::new("not a url", None),
            Err(ScanError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_log_broadcasts() {
        let log = CaptureLog::new();
        let mut receiver = log.subscribe().unwrap();

        let mut exchange = Exchange::default();
        exchange.request.url = "https://api.example.com/a".to_string();
        log.record(exchange.clone());

        assert_eq!(receiver.recv().await.unwrap(), exchange);
        assert_eq!(log.entries().await.unwrap(), vec![exchange]);
    }

    #[tokio::test]
    async fn test_absent_collaborators() {
        let capture: Option<CaptureLog> = None;
        assert!(capture.entries().await.is_none());
        assert!(capture.subscribe().is_none());

        let inspector: Option<HtmlPageInspector> = None;
        assert!(inspector.page_info().await.is_none());
        assert!(inspector.links().await.is_empty());
    }
}
