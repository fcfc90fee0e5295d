//! The remote lookup chain: identifier → search hit → metadata → page.
//!
//! Retrieval walks a small state machine. Each state carries the typed result
//! of the previous stage, and each fallback rule is a single branch in the
//! function that prepares the next request.
//!
//! ```text
//! Identify { loio } ──cache hit / re-search──▶ Locate { hit }
//! Locate { hit }    ──deliverableMetadata────▶ Fetch { hit, metadata }
//! Fetch { .. }      ──pagecontent────────────▶ Done(FetchedPage)
//! ```
//!
//! Stages run strictly in order. Any failure aborts the whole retrieval.

use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::client::{DocsApi, MetadataRequest, RawMetadata};
use crate::docs_url::parse_docs_path_parts;
use crate::error::{DocsError, DocsResult};
use crate::models::{DocumentMetadata, PageContent, SearchHit};

/// A search hit together with the page fetched for it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub hit: SearchHit,
    pub metadata: DocumentMetadata,
    pub page: PageContent,
}

#[derive(Debug, Clone)]
pub enum LookupState {
    /// Only the `loio` is known.
    Identify { loio: String },
    /// The originating hit is known; metadata is next.
    Locate { hit: SearchHit },
    /// Deliverable, build and file path are known; page content is next.
    Fetch {
        hit: SearchHit,
        metadata: DocumentMetadata,
    },
    Done(FetchedPage),
}

impl LookupState {
    pub fn start(loio: impl Into<String>) -> Self {
        LookupState::Identify { loio: loio.into() }
    }

    /// Run one stage.
    pub async fn advance(self, api: &dyn DocsApi, cache: &ResultCache) -> DocsResult<Self> {
        match self {
            LookupState::Identify { loio } => {
                let hit = identify(api, cache, &loio).await?;
                Ok(LookupState::Locate { hit })
            }
            LookupState::Locate { hit } => {
                let request = metadata_request(api.base_url(), &hit)?;
                let raw = api.metadata(&request).await?;
                let metadata = resolve_metadata(raw, &request.topic_url)?;
                debug!(
                    loio = %hit.loio,
                    deliverable_id = %metadata.deliverable_id,
                    build_no = %metadata.build_no,
                    "resolved SAP Help metadata"
                );
                Ok(LookupState::Fetch { hit, metadata })
            }
            LookupState::Fetch { hit, metadata } => {
                let page = api.page_content(&metadata).await?;
                Ok(LookupState::Done(FetchedPage {
                    hit,
                    metadata,
                    page,
                }))
            }
            done @ LookupState::Done(_) => Ok(done),
        }
    }

    /// Run stages until the page is fetched.
    pub async fn run(mut self, api: &dyn DocsApi, cache: &ResultCache) -> DocsResult<FetchedPage> {
        loop {
            self = self.advance(api, cache).await?;
            if let LookupState::Done(page) = self {
                return Ok(page);
            }
        }
    }
}

/// Resolve a `loio` to its search hit, from the cache or by searching for it.
pub async fn identify(api: &dyn DocsApi, cache: &ResultCache, loio: &str) -> DocsResult<SearchHit> {
    if let Some(hit) = cache.get(loio) {
        debug!(loio, "SAP Help hit served from cache");
        return Ok(hit);
    }

    info!(loio, "SAP Help hit not cached, searching by id");
    let hits = api.search(loio).await?;
    if hits.is_empty() {
        return Err(DocsError::EmptySearch(loio.to_string()));
    }

    hits.into_iter()
        .find(|hit| hit.loio == loio)
        .ok_or_else(|| DocsError::DocumentNotFound(loio.to_string()))
}

/// Build the metadata call for a hit.
///
/// `product_url` prefers the hit's explicit product id and falls back to the
/// product segment of its URL. A URL that does not follow the
/// `/docs/{product}/{deliverable}/{file}` convention is tolerated only when
/// the product id is known; the deliverable is then left out.
pub fn metadata_request(base_url: &str, hit: &SearchHit) -> DocsResult<MetadataRequest> {
    let topic_url = format!("{}.html", hit.loio);
    let product_id = hit
        .product_id
        .as_deref()
        .filter(|p| !p.trim().is_empty());

    match (parse_docs_path_parts(base_url, &hit.url), product_id) {
        (Ok(parts), product_id) => Ok(MetadataRequest {
            product_url: product_id
                .map(str::to_string)
                .unwrap_or(parts.product_url_seg),
            topic_url,
            deliverable_url: Some(parts.deliverable_loio),
        }),
        // Worth revisiting against real traffic: this hides URLs that break
        // the path convention whenever the hit names its product.
        (Err(err), Some(product_id)) => {
            warn!(loio = %hit.loio, url = %hit.url, error = %err, "using product id without deliverable");
            Ok(MetadataRequest {
                product_url: product_id.to_string(),
                topic_url,
                deliverable_url: None,
            })
        }
        (Err(err), None) => Err(err),
    }
}

/// Check the metadata response. The file path falls back to `topic_url`.
pub fn resolve_metadata(raw: RawMetadata, topic_url: &str) -> DocsResult<DocumentMetadata> {
    let deliverable_id = raw.deliverable_id.ok_or(DocsError::IncompleteMetadata {
        missing: "deliverable id",
    })?;
    let build_no = raw.build_no.ok_or(DocsError::IncompleteMetadata {
        missing: "build number",
    })?;
    let file_path = raw
        .file_path
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| topic_url.to_string());

    Ok(DocumentMetadata {
        deliverable_id,
        build_no,
        file_path,
    })
}
