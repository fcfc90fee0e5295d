//! Shared test helpers: an in-memory portal and hit builders.

use async_trait::async_trait;
use sap_help_mcp::client::{DocsApi, MetadataRequest, RawMetadata};
use sap_help_mcp::error::{DocsError, DocsResult, Stage};
use sap_help_mcp::models::{DocumentMetadata, PageContent, SearchHit};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const BASE_URL: &str = "https://help.sap.com";

/// In-memory [`DocsApi`] that counts calls and records requests.
pub struct FakeDocsApi {
    pub hits: Vec<SearchHit>,
    pub metadata: RawMetadata,
    pub page: PageContent,
    pub search_status: Option<u16>,
    pub search_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub metadata_requests: Mutex<Vec<MetadataRequest>>,
    pub page_requests: Mutex<Vec<DocumentMetadata>>,
}

#[allow(dead_code)]
impl FakeDocsApi {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            metadata: RawMetadata {
                deliverable_id: Some("4711".to_string()),
                build_no: Some("982".to_string()),
                file_path: Some("abc123.html".to_string()),
            },
            page: PageContent {
                title: Some("Currency Conversion".to_string()),
                body: "<h2>Overview</h2><p>Amounts are converted with the <b>M</b> rate.</p>"
                    .to_string(),
            },
            search_status: None,
            search_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            metadata_requests: Mutex::new(Vec::new()),
            page_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_metadata(mut self, metadata: RawMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_page(mut self, page: PageContent) -> Self {
        self.page = page;
        self
    }

    pub fn failing_search(mut self, status: u16) -> Self {
        self.search_status = Some(status);
        self
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.search_calls.load(Ordering::SeqCst),
            self.metadata_calls.load(Ordering::SeqCst),
            self.page_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl DocsApi for FakeDocsApi {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn search(&self, _query: &str) -> DocsResult<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.search_status {
            return Err(DocsError::RemoteCallFailed {
                stage: Stage::Search,
                status,
                status_text: "Service Unavailable".to_string(),
            });
        }
        Ok(self.hits.clone())
    }

    async fn metadata(&self, request: &MetadataRequest) -> DocsResult<RawMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata_requests.lock().unwrap().push(request.clone());
        Ok(self.metadata.clone())
    }

    async fn page_content(&self, metadata: &DocumentMetadata) -> DocsResult<PageContent> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_requests.lock().unwrap().push(metadata.clone());
        Ok(self.page.clone())
    }
}

/// A hit whose URL follows `/docs/{product}/{deliverable}/{file}`.
#[allow(dead_code)]
pub fn hit(loio: &str) -> SearchHit {
    SearchHit {
        loio: loio.to_string(),
        title: format!("Topic {}", loio),
        url: format!("/docs/SAP_S4HANA_CLOUD/0f69f8fb/{}.html", loio),
        product_id: None,
        product: Some("SAP S/4HANA Cloud".to_string()),
        version: Some("2408".to_string()),
        version_id: None,
        language: Some("en-US".to_string()),
        snippet: Some("How <em>currency</em> amounts are converted".to_string()),
    }
}
