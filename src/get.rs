//! Document retrieval by result id.
//!
//! Resolves a `sap-help-{loio}` id through the lookup chain, converts the
//! page body to text, wraps it in the document envelope (title and metadata
//! header) and bounds the result with the configured truncation policy.
//! Used by both the `sap-help get` CLI command and the `get` tool.

use anyhow::{anyhow, Result};
use tracing::info;

use crate::cache::ResultCache;
use crate::client::{DocsApi, HelpPortalClient};
use crate::config::{Config, ContentConfig};
use crate::convert::html_to_text;
use crate::docs_url::ensure_absolute_url;
use crate::error::{DocsError, DocsResult};
use crate::lookup::{FetchedPage, LookupState};
use crate::models::{loio_from_result_id, RenderedDocument};
use crate::truncate::{truncate, TruncationStrategy};

const NO_CONTENT: &str = "*No content available for this page.*";
const FALLBACK_TITLE: &str = "SAP Help Document";

/// Size bound applied to the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_length: usize,
    pub strategy: TruncationStrategy,
}

impl RenderOptions {
    pub fn from_config(content: &ContentConfig) -> Self {
        Self {
            max_length: content.max_length,
            strategy: content.strategy,
        }
    }
}

/// Fetch and render a document, keeping the typed error.
///
/// An id without the `sap-help-` prefix fails before any remote call.
pub async fn retrieve(
    api: &dyn DocsApi,
    cache: &ResultCache,
    id: &str,
    options: RenderOptions,
) -> DocsResult<RenderedDocument> {
    let id = id.trim();
    let loio = loio_from_result_id(id).ok_or_else(|| DocsError::MalformedIdentifier(id.to_string()))?;

    let fetched = LookupState::start(loio).run(api, cache).await?;
    let document = render(api.base_url(), id, fetched, options);

    info!(
        id,
        original_length = document.original_length,
        truncated = document.was_truncated,
        "retrieved SAP Help page"
    );
    Ok(document)
}

/// Fetch and render a document.
///
/// Failures are reported as a single message prefixed with
/// `Failed to get SAP Help page content:`.
pub async fn get_document(
    api: &dyn DocsApi,
    cache: &ResultCache,
    id: &str,
    options: RenderOptions,
) -> Result<RenderedDocument> {
    retrieve(api, cache, id, options)
        .await
        .map_err(|e| anyhow!("Failed to get SAP Help page content: {}", e))
}

fn render(base_url: &str, id: &str, fetched: FetchedPage, options: RenderOptions) -> RenderedDocument {
    let FetchedPage { hit, page, .. } = fetched;

    let title = page
        .title
        .clone()
        .or_else(|| Some(hit.title.clone()).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let url = ensure_absolute_url(base_url, &hit.url);
    let product = hit.product_label().map(str::to_string);
    let version = hit.version_label().map(str::to_string);
    let language = hit.language.clone().filter(|l| !l.trim().is_empty());
    let summary = hit
        .snippet
        .as_deref()
        .map(html_to_text)
        .filter(|s| !s.is_empty());

    let body = if page.body.trim().is_empty() {
        NO_CONTENT.to_string()
    } else {
        let text = html_to_text(&page.body);
        if text.is_empty() {
            NO_CONTENT.to_string()
        } else {
            text
        }
    };

    let mut header = format!("# {}\n\n**Source**: SAP Help Portal\n**URL**: {}\n", title, url);
    match (&product, &version) {
        (Some(p), Some(v)) => header.push_str(&format!("**Product**: {} {}\n", p, v)),
        (Some(p), None) => header.push_str(&format!("**Product**: {}\n", p)),
        (None, Some(v)) => header.push_str(&format!("**Version**: {}\n", v)),
        (None, None) => {}
    }
    if let Some(lang) = &language {
        header.push_str(&format!("**Language**: {}\n", lang));
    }
    if let Some(summary) = &summary {
        header.push_str(&format!("**Summary**: {}\n", summary));
    }

    let full = format!(
        "{}\n---\n\n{}\n\n---\n\n*Official SAP documentation retrieved from the SAP Help Portal.*",
        header, body
    );
    let bounded = truncate(&full, options.max_length, options.strategy);

    RenderedDocument {
        id: id.to_string(),
        title,
        url,
        product,
        version,
        language,
        summary,
        body,
        text: bounded.content,
        was_truncated: bounded.was_truncated,
        original_length: bounded.original_length,
    }
}

/// CLI entry point: fetch a document and print it.
///
/// The CLI starts with an empty cache, so the id is always re-searched.
pub async fn run_get(config: &Config, id: &str, options: RenderOptions) -> Result<()> {
    let client = HelpPortalClient::new(&config.portal)?;
    let cache = ResultCache::new();

    let doc = get_document(&client, &cache, id, options).await?;
    println!("{}", doc.text);
    if doc.was_truncated {
        eprintln!(
            "(truncated from {} characters to {})",
            doc.original_length,
            doc.text.chars().count()
        );
    }

    Ok(())
}
