//! URL handling for SAP Help document links.
//!
//! Search hits carry site-relative links such as
//! `/docs/{product}/{deliverable}/{file}`. These helpers resolve them against
//! the portal origin and pull out the path parts the metadata call needs.

use url::Url;

use crate::error::{DocsError, DocsResult};

/// Product and deliverable segments of a `/docs/...` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsPathParts {
    pub product_url_seg: String,
    pub deliverable_loio: String,
}

/// Prefix `url` with `base` unless it already has an http(s) scheme.
pub fn ensure_absolute_url(base: &str, url: &str) -> String {
    if has_http_scheme(url) {
        return url.to_string();
    }
    let base = base.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Split a document URL or path into its product and deliverable segments.
///
/// The path must look like `/docs/{product}/{deliverable}/{file}`; anything
/// else is [`DocsError::UnparsableDocumentUrl`]. Query strings and fragments
/// are ignored.
pub fn parse_docs_path_parts(base: &str, url_or_path: &str) -> DocsResult<DocsPathParts> {
    let unparsable = || DocsError::UnparsableDocumentUrl(url_or_path.to_string());

    let resolved = Url::parse(base)
        .and_then(|b| b.join(url_or_path))
        .map_err(|_| unparsable())?;

    let segments: Vec<&str> = resolved
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 4 || segments[0] != "docs" {
        return Err(unparsable());
    }

    Ok(DocsPathParts {
        product_url_seg: segments[1].to_string(),
        deliverable_loio: segments[2].to_string(),
    })
}
