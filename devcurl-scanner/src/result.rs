use chrono::{DateTime, Utc};
use devcurl_core::har::Exchange;
use devcurl_core::response;
use devcurl_core::schema::{Schema, parse_and_infer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Current layout version of the persisted page map
pub const VERSION: &str = "2.0.0";

/// One API call observed while a page was open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecord {
    pub method: String,
    pub path: String,
    pub full_url: String,
    pub status: u16,
    /// From the `content-type` response header only
    pub content_type: Option<String>,
    /// Elapsed time in whole milliseconds
    pub time: u64,
    pub request_schema: Option<Schema>,
    pub response_schema: Option<Schema>,
}

impl ApiRecord {
    /// Build a record from an exchange and its response body, if one was retrieved
    pub fn from_exchange(exchange: &Exchange, body: Option<&str>) -> Self {
        Self {
            method: exchange.method(),
            path: exchange.path_with_query(),
            full_url: exchange.request.url.clone(),
            status: exchange.response.status,
            content_type: response::header_content_type(exchange),
            time: exchange.time.max(0.0).round() as u64,
            request_schema: request_schema(exchange),
            response_schema: body.and_then(parse_and_infer),
        }
    }
}

/// Schema of a JSON request body; other body types have none
fn request_schema(exchange: &Exchange) -> Option<Schema> {
    let post = exchange.request.post_data.as_ref()?;
    let text = post.text.as_deref().filter(|t| !t.is_empty())?;
    if post.mime_type.to_lowercase().contains("json") {
        parse_and_infer(text)
    } else {
        None
    }
}

/// Identity of the page a scan ran against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Path and query of the page
    pub url: String,
    pub framework: String,
    pub route: Option<String>,
    pub params: Option<Value>,
}

impl PageInfo {
    /// Identity used when the page could not be inspected
    pub fn unknown() -> Self {
        Self::url_only("/")
    }

    pub fn url_only(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            framework: "unknown".to_string(),
            route: None,
            params: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub route: Option<String>,
    pub url: String,
    pub params: Option<Value>,
    pub framework: String,
    pub scanned_at: DateTime<Utc>,
    pub apis: Vec<ApiRecord>,
    pub links: Vec<String>,
}

impl PageRecord {
    pub fn new(info: PageInfo, apis: Vec<ApiRecord>, links: Vec<String>) -> Self {
        Self {
            route: info.route,
            url: info.url,
            params: info.params,
            framework: info.framework,
            scanned_at: Utc::now(),
            apis,
            links,
        }
    }

    /// Route when one was detected, the URL otherwise
    pub fn display_name(&self) -> &str {
        self.route.as_deref().unwrap_or(&self.url)
    }
}

/// Every scanned page, keyed by page URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMap {
    pub version: String,
    pub pages: BTreeMap<String, PageRecord>,
}

impl Default for PageMap {
    fn default() -> Self {
        Self {
            version: VERSION.to_string(),
            pages: BTreeMap::new(),
        }
    }
}

/// Pages matching a search, split into scanned pages and pages only seen as links
#[derive(Debug, Default, PartialEq)]
pub struct PageListing<'a> {
    /// Most recently scanned first
    pub scanned: Vec<&'a PageRecord>,
    pub unscanned: Vec<String>,
}

impl PageMap {
    /// Insert a record under its URL, replacing any earlier scan of that URL
    pub fn upsert(&mut self, record: PageRecord) {
        self.pages.insert(record.url.clone(), record);
        self.version = VERSION.to_string();
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Case-insensitive substring search over page URLs.
    ///
    /// Unscanned links are taken from the matching pages only, and must match the
    /// search themselves.
    pub fn listing(&self, search: &str) -> PageListing<'_> {
        let search = search.trim().to_lowercase();
        let matches = |url: &str| search.is_empty() || url.to_lowercase().contains(&search);

        let mut scanned = Vec::new();
        let mut unscanned = Vec::new();
        let mut seen = HashSet::new();

        for (url, page) in &self.pages {
            if !matches(url) {
                continue;
            }
            scanned.push(page);

            for link in &page.links {
                if !self.pages.contains_key(link) && matches(link) && seen.insert(link.as_str()) {
                    unscanned.push(link.clone());
                }
            }
        }

        scanned.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));

        PageListing { scanned, unscanned }
    }
}
