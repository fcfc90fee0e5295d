//! Core data models used throughout the SAP Help pipeline.
//!
//! These types represent the search hits, result entries, and documents that
//! flow through the lookup chain.

use serde::{Deserialize, Serialize};

/// Prefix that turns a portal `loio` into a caller-facing result id.
pub const RESULT_ID_PREFIX: &str = "sap-help-";

/// Raw hit from the portal's search endpoint. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub loio: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl SearchHit {
    /// Product label for display: product name, else product id.
    pub fn product_label(&self) -> Option<&str> {
        non_empty(self.product.as_deref()).or_else(|| non_empty(self.product_id.as_deref()))
    }

    /// Version label for display: version name, else version id.
    pub fn version_label(&self) -> Option<&str> {
        non_empty(self.version.as_deref()).or_else(|| non_empty(self.version_id.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalized projection of a [`SearchHit`] returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub rank: usize,
}

/// Output of the metadata stage, consumed by the page-content stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub deliverable_id: String,
    pub build_no: String,
    pub file_path: String,
}

/// Output of the page-content stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub title: Option<String>,
    pub body: String,
}

/// Final text artifact of a retrieval. Built fresh per call, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub id: String,
    pub title: String,
    pub url: String,
    pub product: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
    pub summary: Option<String>,
    pub body: String,
    /// Full text (envelope + body) after truncation.
    pub text: String,
    pub was_truncated: bool,
    pub original_length: usize,
}

/// Build the caller-facing id for a `loio`.
pub fn result_id(loio: &str) -> String {
    format!("{}{}", RESULT_ID_PREFIX, loio)
}

/// Recover the `loio` from a result id, if the prefix is present.
pub fn loio_from_result_id(id: &str) -> Option<&str> {
    id.strip_prefix(RESULT_ID_PREFIX).filter(|loio| !loio.is_empty())
}
