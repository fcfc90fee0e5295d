//! SAP Help search.
//!
//! Runs the search stage of the lookup chain, records every hit in the
//! [`ResultCache`] so a later `get` can skip re-searching, and projects hits
//! into ranked [`SearchResultEntry`]s. An empty result list is a normal
//! answer with an explanatory message, not an error.

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use tracing::info;

use crate::cache::ResultCache;
use crate::client::{DocsApi, HelpPortalClient};
use crate::config::Config;
use crate::convert::html_to_text;
use crate::docs_url::ensure_absolute_url;
use crate::models::{result_id, SearchHit, SearchResultEntry};

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResultEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Search the portal and cache the hits.
///
/// Failures are reported as a single message prefixed with
/// `SAP Help search failed:`.
pub async fn search_help(
    api: &dyn DocsApi,
    cache: &ResultCache,
    query: &str,
) -> Result<SearchResponse> {
    let query = query.trim();
    if query.is_empty() {
        bail!("query must not be empty");
    }

    let hits = api
        .search(query)
        .await
        .map_err(|e| anyhow!("SAP Help search failed: {}", e))?;

    info!(query, hits = hits.len(), "SAP Help search");

    if hits.is_empty() {
        return Ok(SearchResponse {
            query: query.to_string(),
            results: Vec::new(),
            message: Some(format!(
                "No results found in SAP Help for \"{}\". Try different keywords or a broader search term.",
                query
            )),
        });
    }

    let results = hits
        .into_iter()
        .enumerate()
        .map(|(i, hit)| {
            let entry = to_entry(api.base_url(), &hit, i + 1);
            cache.insert(hit);
            entry
        })
        .collect();

    Ok(SearchResponse {
        query: query.to_string(),
        results,
        message: None,
    })
}

fn to_entry(base_url: &str, hit: &SearchHit, rank: usize) -> SearchResultEntry {
    SearchResultEntry {
        id: result_id(&hit.loio),
        title: hit.title.clone(),
        url: ensure_absolute_url(base_url, &hit.url),
        snippet: entry_snippet(hit),
        rank,
    }
}

/// Hit snippet (or title) followed by product and version when known.
fn entry_snippet(hit: &SearchHit) -> String {
    let text = hit
        .snippet
        .as_deref()
        .map(html_to_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| hit.title.clone());

    match (hit.product_label(), hit.version_label()) {
        (Some(product), Some(version)) => format!("{} (Product: {} {})", text, product, version),
        (Some(product), None) => format!("{} (Product: {})", text, product),
        (None, Some(version)) => format!("{} (Version: {})", text, version),
        (None, None) => text,
    }
}

/// Render a search response as a numbered Markdown list.
pub fn format_search_results(response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return response
            .message
            .clone()
            .unwrap_or_else(|| "No results.".to_string());
    }

    let mut out = format!(
        "Found {} SAP Help results for \"{}\":\n\n",
        response.results.len(),
        response.query
    );
    for entry in &response.results {
        out.push_str(&format!(
            "{}. **{}**\n   id: `{}`\n   {}\n   {}\n\n",
            entry.rank, entry.title, entry.id, entry.url, entry.snippet
        ));
    }
    out.push_str("Use the get tool with one of the ids above to read the full page.");
    out
}

/// CLI entry point: search and print the formatted list.
pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let client = HelpPortalClient::new(&config.portal)?;
    let cache = ResultCache::new();

    let response = search_help(&client, &cache, query).await?;
    println!("{}", format_search_results(&response));

    Ok(())
}
