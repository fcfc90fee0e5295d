//! HTTP access to the SAP Help Portal.
//!
//! The portal exposes three JSON endpoints under `/http.svc/`:
//!
//! | Call | Path | Returns |
//! |------|------|---------|
//! | search | `elasticsearch` | `data.results[]` hits |
//! | metadata | `deliverableMetadata` | `data.deliverable.{id,buildNo}`, `data.filePath` |
//! | page content | `pagecontent` | `data.currentPage.t`, `data.body` |
//!
//! [`DocsApi`] is the seam the lookup chain talks to; [`HelpPortalClient`]
//! implements it with `reqwest`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::PortalConfig;
use crate::error::{DocsError, DocsResult, Stage};
use crate::models::{DocumentMetadata, PageContent, SearchHit};
use crate::query::QueryParams;

/// Parameters of the metadata call, derived from a search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRequest {
    pub product_url: String,
    pub topic_url: String,
    pub deliverable_url: Option<String>,
}

/// Metadata as the portal returned it; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    pub deliverable_id: Option<String>,
    pub build_no: Option<String>,
    pub file_path: Option<String>,
}

/// The three remote calls of the lookup chain.
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Origin used to absolutize and parse document URLs.
    fn base_url(&self) -> &str;

    async fn search(&self, query: &str) -> DocsResult<Vec<SearchHit>>;

    async fn metadata(&self, request: &MetadataRequest) -> DocsResult<RawMetadata>;

    async fn page_content(&self, metadata: &DocumentMetadata) -> DocsResult<PageContent>;
}

/// `reqwest`-backed [`DocsApi`] for the live portal.
pub struct HelpPortalClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
    result_window: u32,
}

impl HelpPortalClient {
    pub fn new(config: &PortalConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::REFERER,
            reqwest::header::HeaderValue::from_str(&format!("{}/", base_url))?,
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            language: config.language.clone(),
            result_window: config.result_window,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        stage: Stage,
        endpoint: &str,
        params: QueryParams,
    ) -> DocsResult<T> {
        let url = format!(
            "{}/http.svc/{}?{}",
            self.base_url,
            endpoint,
            params.to_query_string()
        );
        debug!(stage = %stage, %url, "calling SAP Help");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DocsError::transport(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsError::RemoteCallFailed {
                stage,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DocsError::transport(stage, e))
    }
}

#[async_trait]
impl DocsApi for HelpPortalClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, query: &str) -> DocsResult<Vec<SearchHit>> {
        let params = QueryParams::new()
            .set("transtype", "standard,html,pdf,others")
            .set("state", "PRODUCTION,TEST,DRAFT")
            .set("product", "")
            .set("version", "")
            .set("q", query)
            .set("to", self.result_window.saturating_sub(1))
            .set("area", "content")
            .set("advancedSearch", "0")
            .set("excludeNotSearchable", "1")
            .set("language", &self.language);

        let envelope: Envelope<SearchData> = self.get_json(Stage::Search, "elasticsearch", params).await?;
        let hits: Vec<SearchHit> = envelope
            .data
            .map(|d| d.results)
            .unwrap_or_default()
            .into_iter()
            .filter(|hit| !hit.loio.is_empty())
            .collect();
        debug!(query, hits = hits.len(), "SAP Help search returned");
        Ok(hits)
    }

    async fn metadata(&self, request: &MetadataRequest) -> DocsResult<RawMetadata> {
        let params = QueryParams::new()
            .set("product_url", &request.product_url)
            .set("topic_url", &request.topic_url)
            .set("version", "LATEST")
            .set("loadlandingpageontopicnotfound", "true")
            .set_opt("deliverable_url", request.deliverable_url.as_deref())
            .set("language", &self.language)
            .set("deliverableInfo", "1")
            .set("toc", "1");

        let envelope: Envelope<MetadataData> = self
            .get_json(Stage::Metadata, "deliverableMetadata", params)
            .await?;
        Ok(envelope.data.map(RawMetadata::from).unwrap_or_default())
    }

    async fn page_content(&self, metadata: &DocumentMetadata) -> DocsResult<PageContent> {
        let params = QueryParams::new()
            .set("deliverableInfo", "1")
            .set("deliverable_id", &metadata.deliverable_id)
            .set("buildNo", &metadata.build_no)
            .set("file_path", &metadata.file_path);

        let envelope: Envelope<PageData> = self
            .get_json(Stage::PageContent, "pagecontent", params)
            .await?;
        Ok(envelope.data.map(PageContent::from).unwrap_or_default())
    }
}

// ============ Wire formats ============

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataData {
    #[serde(default)]
    deliverable: Option<DeliverableData>,
    #[serde(default)]
    file_path: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliverableData {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    build_no: Option<Value>,
}

impl From<MetadataData> for RawMetadata {
    fn from(data: MetadataData) -> Self {
        let (id, build_no) = data
            .deliverable
            .map(|d| (d.id, d.build_no))
            .unwrap_or_default();
        RawMetadata {
            deliverable_id: id.as_ref().and_then(scalar_to_string),
            build_no: build_no.as_ref().and_then(scalar_to_string),
            file_path: data.file_path.as_ref().and_then(scalar_to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageData {
    #[serde(default)]
    current_page: Option<CurrentPage>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentPage {
    #[serde(default)]
    t: Option<String>,
}

impl From<PageData> for PageContent {
    fn from(data: PageData) -> Self {
        PageContent {
            title: data
                .current_page
                .and_then(|p| p.t)
                .filter(|t| !t.trim().is_empty()),
            body: data.body.unwrap_or_default(),
        }
    }
}

/// The portal sends ids and build numbers as either strings or numbers.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
