//! # SAP Help MCP
//!
//! Search and read SAP Help Portal documentation from agents and the shell.
//!
//! A search returns ranked hits identified by `sap-help-{loio}` ids. Reading
//! an id walks a three-step remote lookup chain (search, deliverable
//! metadata, page content), converts the page markup to plain text and bounds
//! the result to a configured length.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │  CLI / MCP │──▶│ search / get │──▶│  Lookup chain   │
//! │  HTTP API  │   │ + ResultCache│   │ search→meta→page│
//! └────────────┘   └──────┬───────┘   └────────┬────────┘
//!                         │                    ▼
//!                         │            ┌───────────────┐
//!                         └───────────▶│ convert +     │
//!                                      │ truncate      │
//!                                      └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sap-help search "currency conversion"
//! sap-help get sap-help-9f5a1c2b3d4e4f5a8b6c7d8e9f0a1b2c --max-length 20000
//! sap-help serve http            # JSON tool API + /mcp
//! sap-help serve stdio           # MCP over stdin/stdout
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and env overrides |
//! | [`models`] | Hits, result entries, fetched documents |
//! | [`query`] | Query-string builder for portal calls |
//! | [`docs_url`] | Document URL normalization and parsing |
//! | [`client`] | Portal HTTP client behind the [`client::DocsApi`] seam |
//! | [`lookup`] | The three-step lookup chain |
//! | [`convert`] | Markup-to-text conversion |
//! | [`truncate`] | Length bounding with truncation notices |
//! | [`cache`] | Search-hit cache shared across requests |
//! | [`search`] | Search entry point |
//! | [`get`] | Document retrieval entry point |
//! | [`traits`] | Tool trait and registry |
//! | [`server`] | HTTP server |
//! | [`mcp`] | MCP protocol bridge |

pub mod cache;
pub mod client;
pub mod config;
pub mod convert;
pub mod docs_url;
pub mod error;
pub mod get;
pub mod lookup;
pub mod mcp;
pub mod models;
pub mod query;
pub mod search;
pub mod server;
pub mod traits;
pub mod truncate;
