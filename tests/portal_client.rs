//! Tests of the HTTP client against a mock portal.

use mockito::{Matcher, Server};
use sap_help_mcp::cache::ResultCache;
use sap_help_mcp::client::{DocsApi, HelpPortalClient, MetadataRequest};
use sap_help_mcp::config::PortalConfig;
use sap_help_mcp::error::{DocsError, Stage};
use sap_help_mcp::get::{get_document, RenderOptions};
use sap_help_mcp::models::DocumentMetadata;
use sap_help_mcp::truncate::TruncationStrategy;
use serde_json::json;

fn portal(base_url: &str) -> PortalConfig {
    PortalConfig {
        base_url: base_url.to_string(),
        ..PortalConfig::default()
    }
}

fn search_body() -> String {
    json!({
        "data": {
            "results": [
                {
                    "loio": "abc123",
                    "title": "Currency Conversion",
                    "url": "/docs/SAP_S4HANA_CLOUD/0f69f8fb/abc123.html",
                    "productId": "SAP_S4HANA_CLOUD",
                    "product": "SAP S/4HANA Cloud",
                    "version": "2408",
                    "language": "en-US",
                    "snippet": "How <em>currency</em> amounts are converted"
                },
                { "title": "No loio" }
            ]
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_search_request_shape() {
    let mut server = Server::new_async().await;
    let referer = format!("{}/", server.url());
    let mock = server
        .mock("GET", "/http.svc/elasticsearch")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("transtype".into(), "standard,html,pdf,others".into()),
            Matcher::UrlEncoded("state".into(), "PRODUCTION,TEST,DRAFT".into()),
            Matcher::UrlEncoded("q".into(), "currency conversion".into()),
            Matcher::UrlEncoded("to".into(), "19".into()),
            Matcher::UrlEncoded("area".into(), "content".into()),
            Matcher::UrlEncoded("advancedSearch".into(), "0".into()),
            Matcher::UrlEncoded("excludeNotSearchable".into(), "1".into()),
            Matcher::UrlEncoded("language".into(), "en-US".into()),
        ]))
        .match_header("accept", "application/json")
        .match_header("user-agent", Matcher::Regex("^sap-help-mcp/".into()))
        .match_header("referer", referer.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_body())
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let hits = client.search("currency conversion").await.unwrap();

    mock.assert_async().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].loio, "abc123");
    assert_eq!(hits[0].product_id.as_deref(), Some("SAP_S4HANA_CLOUD"));
}

#[tokio::test]
async fn test_search_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/http.svc/elasticsearch")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let err = client.search("currency").await.unwrap_err();

    match err {
        DocsError::RemoteCallFailed { stage, status, .. } => {
            assert_eq!(stage, Stage::Search);
            assert_eq!(status, 500);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_search_malformed_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/http.svc/elasticsearch")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let err = client.search("currency").await.unwrap_err();

    assert!(matches!(err, DocsError::Transport { stage: Stage::Search, .. }));
}

#[tokio::test]
async fn test_metadata_request_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/http.svc/deliverableMetadata")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("product_url".into(), "SAP_S4HANA_CLOUD".into()),
            Matcher::UrlEncoded("topic_url".into(), "abc123.html".into()),
            Matcher::UrlEncoded("version".into(), "LATEST".into()),
            Matcher::UrlEncoded("loadlandingpageontopicnotfound".into(), "true".into()),
            Matcher::UrlEncoded("deliverable_url".into(), "0f69f8fb".into()),
            Matcher::UrlEncoded("deliverableInfo".into(), "1".into()),
            Matcher::UrlEncoded("toc".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "deliverable": { "id": 4711, "buildNo": "982" },
                    "filePath": "abc123.html"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let raw = client
        .metadata(&MetadataRequest {
            product_url: "SAP_S4HANA_CLOUD".to_string(),
            topic_url: "abc123.html".to_string(),
            deliverable_url: Some("0f69f8fb".to_string()),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(raw.deliverable_id.as_deref(), Some("4711"));
    assert_eq!(raw.build_no.as_deref(), Some("982"));
}

#[tokio::test]
async fn test_page_content_request_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/http.svc/pagecontent")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("deliverableInfo".into(), "1".into()),
            Matcher::UrlEncoded("deliverable_id".into(), "4711".into()),
            Matcher::UrlEncoded("buildNo".into(), "982".into()),
            Matcher::UrlEncoded("file_path".into(), "abc123.html".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "currentPage": { "t": "Currency Conversion" },
                    "body": "<p>Body</p>"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let page = client
        .page_content(&DocumentMetadata {
            deliverable_id: "4711".to_string(),
            build_no: "982".to_string(),
            file_path: "abc123.html".to_string(),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(page.title.as_deref(), Some("Currency Conversion"));
    assert_eq!(page.body, "<p>Body</p>");
}

#[tokio::test]
async fn test_get_document_over_http() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/http.svc/elasticsearch")
        .match_query(Matcher::UrlEncoded("q".into(), "abc123".into()))
        .with_status(200)
        .with_body(search_body())
        .create_async()
        .await;
    server
        .mock("GET", "/http.svc/deliverableMetadata")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "data": { "deliverable": { "id": "4711", "buildNo": 982 } } }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/http.svc/pagecontent")
        .match_query(Matcher::UrlEncoded("file_path".into(), "abc123.html".into()))
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "currentPage": { "t": "Currency Conversion" },
                    "body": "<h2>Rates</h2><ul><li>M: average rate</li><li>B: bank buying rate</li></ul>"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let cache = ResultCache::new();
    let doc = get_document(
        &client,
        &cache,
        "sap-help-abc123",
        RenderOptions {
            max_length: 75_000,
            strategy: TruncationStrategy::HeadTail,
        },
    )
    .await
    .unwrap();

    search.assert_async().await;
    assert!(doc.text.starts_with("# Currency Conversion"));
    assert!(doc.text.contains("**Product**: SAP S/4HANA Cloud 2408"));
    assert!(doc.text.contains("• M: average rate"));
    assert!(doc.url.starts_with(&server.url()));
}

#[tokio::test]
async fn test_page_content_failure_on_http() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/http.svc/elasticsearch")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(search_body())
        .create_async()
        .await;
    server
        .mock("GET", "/http.svc/deliverableMetadata")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "data": { "deliverable": { "id": "4711", "buildNo": "982" } } }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/http.svc/pagecontent")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let client = HelpPortalClient::new(&portal(&server.url())).unwrap();
    let cache = ResultCache::new();
    let err = get_document(
        &client,
        &cache,
        "sap-help-abc123",
        RenderOptions {
            max_length: 75_000,
            strategy: TruncationStrategy::Head,
        },
    )
    .await
    .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("Failed to get SAP Help page content: "));
    assert!(msg.contains("page content request failed: 404"));
}
