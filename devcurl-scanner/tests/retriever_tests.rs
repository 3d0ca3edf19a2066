use devcurl_core::har::Exchange;
use devcurl_scanner::BodyRetriever;
use devcurl_scanner::source::{ChainRetriever, HarContentRetriever, RefetchRetriever};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn exchange(method: &str, url: String, text: Option<&str>) -> Exchange {
    let mut exchange = Exchange::default();
    exchange.request.method = method.to_string();
    exchange.request.url = url;
    exchange.response.content.text = text.map(|t| t.to_string());
    exchange
}

#[tokio::test]
async fn test_har_content_retriever() {
    let retriever = HarContentRetriever;
    let with_body = exchange("GET", "https://a.test/x".into(), Some("{}"));
    let empty = exchange("GET", "https://a.test/x".into(), Some(""));
    let absent = exchange("GET", "https://a.test/x".into(), None);

    assert_eq!(retriever.retrieve(&with_body).await, Some("{}".to_string()));
    assert_eq!(retriever.retrieve(&empty).await, None);
    assert_eq!(retriever.retrieve(&absent).await, None);
}

#[tokio::test]
async fn test_refetch_retriever_fetches_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"[{"id":1}]"#),
        )
        .mount(&mock_server)
        .await;

    let retriever = RefetchRetriever::new(Duration::from_secs(5)).unwrap();
    let target = exchange("GET", format!("{}/api/users", mock_server.uri()), None);

    assert_eq!(
        retriever.retrieve(&target).await,
        Some(r#"[{"id":1}]"#.to_string())
    );
}

#[tokio::test]
async fn test_refetch_retriever_skips_unsafe_methods() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("created"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let retriever = RefetchRetriever::new(Duration::from_secs(5)).unwrap();
    let target = exchange("POST", format!("{}/api/users", mock_server.uri()), None);

    assert_eq!(retriever.retrieve(&target).await, None);
}

#[tokio::test]
async fn test_refetch_retriever_unreachable_host() {
    let retriever = RefetchRetriever::new(Duration::from_secs(1)).unwrap();
    let target = exchange("GET", "http://127.0.0.1:1/nothing".to_string(), None);
    assert_eq!(retriever.retrieve(&target).await, None);
}

#[tokio::test]
async fn test_chain_prefers_capture_then_refetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from server"))
        .mount(&mock_server)
        .await;

    let retriever = ChainRetriever::new(
        HarContentRetriever,
        RefetchRetriever::new(Duration::from_secs(5)).unwrap(),
    );

    let captured = exchange("GET", format!("{}/fresh", mock_server.uri()), Some("from har"));
    let missing = exchange("GET", format!("{}/fresh", mock_server.uri()), None);

    assert_eq!(retriever.retrieve(&captured).await, Some("from har".to_string()));
    assert_eq!(retriever.retrieve(&missing).await, Some("from server".to_string()));
}
