//! Error kinds raised by the SAP Help lookup pipeline.
//!
//! Every failure inside the pipeline is a [`DocsError`]. The public entry
//! points ([`crate::search`], [`crate::get`]) turn them into a single
//! descriptive message with a fixed context prefix; nothing is retried
//! internally.

use thiserror::Error;

/// Which remote call of the lookup chain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Metadata,
    PageContent,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Search => "search",
            Stage::Metadata => "metadata",
            Stage::PageContent => "page content",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DocsError {
    /// Non-2xx HTTP status on any of the three remote calls.
    #[error("SAP Help {stage} request failed: {status} {status_text}")]
    RemoteCallFailed {
        stage: Stage,
        status: u16,
        status_text: String,
    },

    /// The connection failed or the body was not the JSON we expected.
    #[error("SAP Help {stage} request could not be completed: {message}")]
    Transport { stage: Stage, message: String },

    #[error("invalid SAP Help result id '{0}': expected the 'sap-help-' prefix")]
    MalformedIdentifier(String),

    #[error("SAP Help document not found: {0}")]
    DocumentNotFound(String),

    #[error("unexpected document URL: {0}")]
    UnparsableDocumentUrl(String),

    #[error("SAP Help metadata response is missing {missing}")]
    IncompleteMetadata { missing: &'static str },

    /// The identifier re-search came back empty.
    #[error("SAP Help document not found (search returned no results): {0}")]
    EmptySearch(String),
}

impl DocsError {
    pub(crate) fn transport(stage: Stage, err: impl std::fmt::Display) -> Self {
        DocsError::Transport {
            stage,
            message: err.to_string(),
        }
    }
}

pub type DocsResult<T> = std::result::Result<T, DocsError>;
