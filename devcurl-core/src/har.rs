// HAR (HTTP Archive) entry model

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// A single captured request/response pair, following the HAR entry shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(default)]
    pub request: Request,
    #[serde(default)]
    pub response: Response,
    /// Total elapsed time in milliseconds
    #[serde(default)]
    pub time: f64,
    /// Chrome's resource classification (`xhr`, `fetch`, `document`, ...)
    #[serde(
        rename = "_resourceType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<PostData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<PostParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostParam {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

/// Top level of a `.har` file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Har {
    pub log: Log,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub entries: Vec<Exchange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl Har {
    /// Document entry of a page: the one requested at `page_url`, or the first document
    pub fn document(&self, page_url: Option<&str>) -> Option<&Exchange> {
        self.log.entries.iter().find(|e| {
            e.is_document() && page_url.is_none_or(|url| e.request.url == url)
        })
    }

    /// URL of a page: `page_url`, else the first document, else the first page title
    pub fn page_url<'a>(&'a self, page_url: Option<&'a str>) -> Option<&'a str> {
        page_url
            .or_else(|| self.document(None).map(|d| d.request.url.as_str()))
            .or_else(|| {
                self.log
                    .pages
                    .first()
                    .map(|p| p.title.as_str())
                    .filter(|title| !title.is_empty())
            })
    }

    /// `pageref` of a page, from its document entry or a page whose title is its URL
    pub fn page_ref(&self, page_url: Option<&str>) -> Option<&str> {
        if let Some(pageref) = self.document(page_url).and_then(|d| d.pageref.as_deref()) {
            return Some(pageref);
        }
        let url = self.page_url(page_url)?;
        self.log
            .pages
            .iter()
            .find(|p| p.title == url)
            .map(|p| p.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Entries recorded on a page. Entries without a `pageref` belong to every page.
    pub fn page_entries(&self, pageref: Option<&str>) -> Vec<Exchange> {
        self.log
            .entries
            .iter()
            .filter(|e| match (pageref, e.pageref.as_deref()) {
                (Some(page), Some(entry_page)) => page == entry_page,
                _ => true,
            })
            .cloned()
            .collect()
    }
}

impl Exchange {
    /// Upper-cased request method, `GET` when the capture left it blank
    pub fn method(&self) -> String {
        let method = self.request.method.trim();
        if method.is_empty() {
            "GET".to_string()
        } else {
            method.to_uppercase()
        }
    }

    /// True for `xhr`/`fetch` entries, and for entries that carry no resource type at all
    pub fn is_programmatic(&self) -> bool {
        match &self.resource_type {
            None => true,
            Some(kind) => {
                let kind = kind.to_lowercase();
                kind == "xhr" || kind == "fetch"
            }
        }
    }

    pub fn is_document(&self) -> bool {
        self.resource_type
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("document"))
    }

    /// Request URL reduced to `path?query`, or the raw URL if it does not parse
    pub fn path_with_query(&self) -> String {
        path_with_query(&self.request.url)
    }
}

pub fn path_with_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) if !query.is_empty() => format!("{}?{}", parsed.path(), query),
            _ => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Parse a HAR document from a string
pub fn parse_har_str(content: &str) -> serde_json::Result<Har> {
    serde_json::from_str(content)
}

/// Load a HAR file from disk
pub fn parse_har_file(path: &Path) -> Result<Har, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read HAR file {}: {}", path.display(), e))?;
    parse_har_str(&content).map_err(|e| format!("Invalid HAR file {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_entry() {
        let entry: Exchange = serde_json::from_str(r#"{"request":{"url":"https://a.test/x"}}"#).unwrap();
        assert_eq!(entry.request.url, "https://a.test/x");
        assert_eq!(entry.method(), "GET");
        assert_eq!(entry.response.status, 0);
        assert!(entry.request.post_data.is_none());
    }

    #[test]
    fn test_deserialize_post_data_params() {
        let entry: Exchange = serde_json::from_str(
            r#"{"request":{"method":"post","url":"https://a.test/up","headers":[],
                "postData":{"mimeType":"multipart/form-data","params":[
                    {"name":"file","fileName":"cat.png"},{"name":"title","value":"Cat"}]}},
                "_resourceType":"fetch","time":12.6}"#,
        )
        .unwrap();
        let post = entry.request.post_data.as_ref().unwrap();
        assert_eq!(entry.method(), "POST");
        assert_eq!(post.params.len(), 2);
        assert_eq!(post.params[0].file_name.as_deref(), Some("cat.png"));
        assert!(entry.is_programmatic());
    }

    #[test]
    fn test_is_programmatic() {
        let mut entry = Exchange::default();
        assert!(entry.is_programmatic());
        entry.resource_type = Some("XHR".to_string());
        assert!(entry.is_programmatic());
        entry.resource_type = Some("image".to_string());
        assert!(!entry.is_programmatic());
        entry.resource_type = Some("document".to_string());
        assert!(entry.is_document());
    }

    const TWO_PAGES: &str = r#"{"log":{
        "pages":[{"id":"p1","title":"https://app.test/a"},{"id":"p2","title":"https://app.test/b"}],
        "entries":[
            {"pageref":"p1","request":{"url":"https://app.test/a"},"_resourceType":"document"},
            {"pageref":"p1","request":{"url":"https://app.test/only-a"},"_resourceType":"fetch"},
            {"pageref":"p2","request":{"url":"https://app.test/b"},"_resourceType":"document"},
            {"pageref":"p2","request":{"url":"https://app.test/only-b"},"_resourceType":"fetch"},
            {"request":{"url":"https://app.test/shared"},"_resourceType":"fetch"}
        ]}}"#;

    fn urls(entries: &[Exchange]) -> Vec<&str> {
        entries.iter().map(|e| e.request.url.as_str()).collect()
    }

    #[test]
    fn test_page_entries_follow_pageref() {
        let har = parse_har_str(TWO_PAGES).unwrap();
        assert_eq!(har.page_ref(Some("https://app.test/b")), Some("p2"));
        assert_eq!(har.page_ref(None), Some("p1"));
        assert_eq!(
            urls(&har.page_entries(har.page_ref(Some("https://app.test/b")))),
            vec!["https://app.test/b", "https://app.test/only-b", "https://app.test/shared"]
        );
        assert_eq!(har.page_entries(None).len(), 5);
    }

    #[test]
    fn test_page_falls_back_to_page_titles() {
        let mut har = parse_har_str(TWO_PAGES).unwrap();
        har.log.entries.retain(|e| !e.is_document());
        assert_eq!(har.page_url(None), Some("https://app.test/a"));
        assert_eq!(har.page_ref(None), Some("p1"));
        assert_eq!(har.page_ref(Some("https://app.test/b")), Some("p2"));
        assert_eq!(har.page_ref(Some("https://app.test/c")), None);
    }

    #[test]
    fn test_path_with_query() {
        assert_eq!(path_with_query("https://api.example.com/users?id=5"), "/users?id=5");
        assert_eq!(path_with_query("https://api.example.com"), "/");
        assert_eq!(path_with_query("not a url"), "not a url");
    }
}
