use chrono::{Duration as ChronoDuration, Utc};
use devcurl::handlers::*;
use devcurl_core::codegen::Dialect;
use devcurl_core::data::MemoryStore;
use devcurl_core::headers::HeaderFilterList;
use devcurl_scanner::PageMapStore;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

const CAPTURE: &str = r#"{"log":{"entries":[
    {"request":{"method":"GET","url":"https://app.example.com/orders"},
     "response":{"status":200,"content":{"mimeType":"text/html",
        "text":"<a href=\"/orders/1\">First</a><a href=\"/help\">Help</a>"}},
     "_resourceType":"document","time":80},
    {"request":{"method":"GET","url":"https://api.example.com/orders?page=1",
        "headers":[{"name":"Accept","value":"application/json"},
                   {"name":"User-Agent","value":"Mozilla/5.0"},
                   {"name":"Cookie","value":"sid=abc"}]},
     "response":{"status":200,"statusText":"OK",
        "headers":[{"name":"Content-Type","value":"application/json; charset=utf-8"}],
        "content":{"mimeType":"application/json","size":24,
            "text":"{\"orders\":[{\"id\":1}],\"total\":1}"}},
     "_resourceType":"fetch","time":42.2},
    {"request":{"method":"POST","url":"https://api.example.com/orders",
        "headers":[{"name":"Content-Type","value":"application/json"}],
        "postData":{"mimeType":"application/json","text":"{\"item\":\"book\"}"}},
     "response":{"status":201,"content":{"mimeType":"application/json","text":"{\"id\":2}"}},
     "_resourceType":"xhr","time":51},
    {"request":{"method":"GET","url":"https://cdn.example.com/logo.png"},
     "response":{"status":200,"content":{"mimeType":"image/png"}},
     "_resourceType":"image","time":5}
]}}"#;

fn capture_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", CAPTURE).unwrap();
    file
}

fn strip(text: &str) -> String {
    // Drop ANSI color sequences so assertions see plain text
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn test_load_har() {
    let file = capture_file();
    let har = load_har(&PathBuf::from(file.path())).unwrap();
    assert_eq!(har.log.entries.len(), 4);
}

#[test]
fn test_load_har_errors() {
    assert!(load_har(&PathBuf::from("/definitely/missing.har")).is_err());

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(load_har(file.path()).is_err());
}

#[test]
fn test_select_exchange() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();
    assert_eq!(select_exchange(&har, 3).unwrap().method(), "POST");
    assert!(select_exchange(&har, 0).is_err());
    assert!(select_exchange(&har, 5).is_err());
}

#[test]
fn test_render_listing() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();

    let listing = strip(&render_listing(&har, false));
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].trim_start().starts_with("2  GET"));
    assert!(lines[0].contains("/orders?page=1"));
    assert!(lines[0].contains("application/json"));
    assert!(lines[0].contains("42 ms"));
    assert!(lines[1].trim_start().starts_with("3  POST"));

    assert_eq!(strip(&render_listing(&har, true)).lines().count(), 4);
}

#[test]
fn test_render_code_uses_filter_list() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();
    let exchange = select_exchange(&har, 2).unwrap();

    let curl = render_code(exchange, Dialect::Curl, &HeaderFilterList::default());
    assert!(curl.starts_with("curl 'https://api.example.com/orders?page=1'"));
    assert!(curl.contains("-H 'Accept: application/json'"));
    assert!(!curl.contains("User-Agent"));
    assert!(curl.contains("-b 'sid=abc'"));

    let fetch = render_code(exchange, Dialect::Fetch, &HeaderFilterList::empty());
    assert!(fetch.contains("'Accept': 'application/json'"));
    assert!(!fetch.contains("Mozilla"));
    assert!(!fetch.contains("sid=abc"));

    let mut excludes = HeaderFilterList::default();
    excludes.add("accept");
    let curl = render_code(exchange, Dialect::Curl, &excludes);
    assert!(!curl.contains("Accept"));
}

#[test]
fn test_render_response() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();
    let exchange = select_exchange(&har, 2).unwrap();

    let full = strip(&render_response(exchange, false, false));
    assert!(full.starts_with("200 OK  application/json  42 ms  24 bytes"));
    assert!(full.contains("\"total\": 1"));

    let headers = strip(&render_response(exchange, true, false));
    assert!(headers.contains("Content-Type: application/json; charset=utf-8"));
    assert!(!headers.contains("\"total\""));

    let body = render_response(exchange, false, true);
    assert!(body.starts_with('{'));
}

#[test]
fn test_render_header_list() {
    let text = strip(&render_header_list(&HeaderFilterList::default()));
    assert!(text.contains("sec-fetch-mode"));
    assert!(strip(&render_header_list(&HeaderFilterList::empty())).contains("No headers filtered"));
}

#[test]
fn test_time_ago() {
    let now = Utc::now();
    assert_eq!(time_ago(now - ChronoDuration::seconds(5), now), "5s ago");
    assert_eq!(time_ago(now - ChronoDuration::minutes(3), now), "3m ago");
    assert_eq!(time_ago(now - ChronoDuration::hours(2), now), "2h ago");
    assert_eq!(time_ago(now - ChronoDuration::days(4), now), "4d ago");
    assert_eq!(time_ago(now + ChronoDuration::seconds(30), now), "0s ago");
}

#[tokio::test]
async fn test_run_scan_and_render_map() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();
    let store = PageMapStore::new(Arc::new(MemoryStore::new()));
    let options = ScanOptions {
        page: None,
        refetch: false,
        timeout: Duration::from_secs(5),
    };

    let report = run_scan(&har, &options, &store, None).await.unwrap();
    assert_eq!(report.page.url, "/orders");
    assert_eq!(report.page.apis.len(), 2);
    assert_eq!(report.page.links, vec!["/orders/1", "/help"]);

    let map = store.load().unwrap();
    let text = strip(&render_page_map(&map, "", Utc::now()));
    assert!(text.contains("/orders"));
    assert!(text.contains("2 APIs"));
    assert!(text.contains("response: { orders: [{ id: number }], total: number }"));
    assert!(text.contains("request:  { item: string }"));
    assert!(text.contains("Not yet scanned"));
    assert!(text.contains("/help"));

    let filtered = strip(&render_page_map(&map, "nothing-matches", Utc::now()));
    assert_eq!(filtered, "No scanned pages\n");
}

#[tokio::test]
async fn test_run_scan_with_explicit_page() {
    let file = capture_file();
    let har = load_har(file.path()).unwrap();
    let store = PageMapStore::new(Arc::new(MemoryStore::new()));
    let options = ScanOptions {
        page: Some("https://app.example.com/checkout?step=2"),
        refetch: false,
        timeout: Duration::from_secs(5),
    };

    let report = run_scan(&har, &options, &store, None).await.unwrap();
    assert_eq!(report.page.url, "/checkout?step=2");
    assert!(report.page.links.is_empty());
}

#[test]
fn test_export_map() {
    let temp_dir = TempDir::new().unwrap();
    let store = PageMapStore::new(Arc::new(MemoryStore::new()));

    match export_map(&store, temp_dir.path()).unwrap() {
        ExportOutcome::File(path) => assert!(path.exists()),
        other => panic!("expected a file, got {:?}", other),
    }

    match export_map(&store, &temp_dir.path().join("missing")).unwrap() {
        ExportOutcome::Stdout(json) => assert!(json.contains("\"version\": \"2.0.0\"")),
        other => panic!("expected stdout fallback, got {:?}", other),
    }
}

#[test]
fn test_expand_path() {
    let expanded = expand_path("~/devcurl.db");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert_eq!(expand_path("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
}
