//! Tool trait, tool context, and the built-in SAP Help tools.
//!
//! Every tool the server exposes implements [`Tool`] and lives in a
//! [`ToolRegistry`]. Both front ends (the JSON HTTP API in [`crate::server`]
//! and the MCP bridge in [`crate::mcp`]) dispatch through the same registry,
//! so a tool behaves identically whichever way it is called.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │             ToolRegistry             │
//! │  ┌────────────────┐ ┌──────────────┐ │
//! │  │ sap_help_search│ │ sap_help_get │ │
//! │  └────────────────┘ └──────────────┘ │
//! └──────────────┬───────────────────────┘
//!                ▼
//!        ToolContext (api + cache)
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::client::{DocsApi, HelpPortalClient};
use crate::config::Config;
use crate::get::{get_document, RenderOptions};
use crate::models::RenderedDocument;
use crate::search::{search_help, SearchResponse};
use crate::truncate::{TruncationStrategy, MIN_MAX_LENGTH};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use sap_help_mcp::traits::{Tool, ToolContext};
///
/// pub struct CacheSizeTool;
///
/// #[async_trait]
/// impl Tool for CacheSizeTool {
///     fn name(&self) -> &str { "cache_size" }
///     fn description(&self) -> &str { "Number of cached search hits" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "cached": ctx.cache().len() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, used as the route path (`POST /tools/{name}`) and the MCP
    /// tool name.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with the server. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema for the parameters (`type: "object"`).
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with validated parameters.
    ///
    /// A `Value::String` result is passed to MCP clients as plain text; any
    /// other value is sent as pretty-printed JSON.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared state handed to every tool call: configuration, the portal API
/// and the result cache. Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    api: Arc<dyn DocsApi>,
    cache: Arc<ResultCache>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, api: Arc<dyn DocsApi>, cache: Arc<ResultCache>) -> Self {
        Self { config, api, cache }
    }

    /// Context backed by the live portal and a fresh cache.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let api = Arc::new(HelpPortalClient::new(&config.portal)?);
        Ok(Self::new(config, api, Arc::new(ResultCache::new())))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Search SAP Help. Equivalent to `sap-help search`.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        search_help(self.api.as_ref(), &self.cache, query).await
    }

    /// Retrieve a document by result id, using the configured size bound
    /// unless `options` overrides it.
    pub async fn get(&self, id: &str, options: Option<RenderOptions>) -> Result<RenderedDocument> {
        let options = options.unwrap_or_else(|| RenderOptions::from_config(&self.config.content));
        get_document(self.api.as_ref(), &self.cache, id, options).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Built-in search tool. Delegates to [`ToolContext::search`].
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "sap_help_search"
    }

    fn description(&self) -> &str {
        "Search the SAP Help Portal. Returns ranked results with ids to pass to sap_help_get."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search terms, e.g. \"currency conversion\"" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            bail!("query must not be empty");
        }

        let response = ctx.search(query).await?;
        Ok(serde_json::to_value(&response)?)
    }
}

/// Built-in document retrieval tool. Delegates to [`ToolContext::get`].
pub struct GetTool;

#[async_trait]
impl Tool for GetTool {
    fn name(&self) -> &str {
        "sap_help_get"
    }

    fn description(&self) -> &str {
        "Retrieve the full text of a SAP Help page by the id returned from sap_help_search"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "result_id": { "type": "string", "description": "Result id, e.g. sap-help-<loio>" },
                "max_length": { "type": "integer", "description": "Maximum characters to return (at least 500)" },
                "strategy": {
                    "type": "string",
                    "enum": ["head_tail", "head"],
                    "description": "Keep beginning and end (head_tail) or only the beginning (head)"
                }
            },
            "required": ["result_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = params["result_id"].as_str().unwrap_or("");
        if id.trim().is_empty() {
            bail!("result_id must not be empty");
        }

        let defaults = RenderOptions::from_config(&ctx.config.content);
        let max_length = match params.get("max_length").and_then(|v| v.as_u64()) {
            Some(n) if (n as usize) < MIN_MAX_LENGTH => {
                bail!("invalid max_length: must be at least {}", MIN_MAX_LENGTH)
            }
            Some(n) => n as usize,
            None => defaults.max_length,
        };
        let strategy = match params.get("strategy").and_then(|v| v.as_str()) {
            Some(s) => s.parse::<TruncationStrategy>()?,
            None => defaults.strategy,
        };

        let doc = ctx
            .get(
                id,
                Some(RenderOptions {
                    max_length,
                    strategy,
                }),
            )
            .await?;
        Ok(Value::String(doc.text))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Serializable tool info for the `/tools/list` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

/// Registry of tools served by the HTTP API and the MCP bridge.
///
/// ```rust
/// use sap_help_mcp::traits::ToolRegistry;
///
/// let tools = ToolRegistry::with_builtins();
/// assert!(tools.find("sap_help_search").is_some());
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with `sap_help_search` and `sap_help_get`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchTool));
        registry.register(Box::new(GetTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                builtin: t.is_builtin(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's JSON Schema: required fields present,
/// declared types and enums respected. Defaults from the schema are filled
/// in for absent fields.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be an object, got {}", json_type_name(other)),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for req_field in &required {
        if !params_obj.contains_key(*req_field) {
            bail!("missing required parameter: {}", req_field);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        let Some(value) = params_obj.get(prop_name) else {
            if let Some(default) = prop_schema.get("default") {
                result.insert(prop_name.clone(), default.clone());
            }
            continue;
        };

        if let Some(expected_type) = prop_schema.get("type").and_then(|t| t.as_str()) {
            let type_ok = match expected_type {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !type_ok {
                bail!(
                    "invalid parameter '{}': must be of type '{}', got {}",
                    prop_name,
                    expected_type,
                    json_type_name(value)
                );
            }
        }

        if let Some(enum_values) = prop_schema.get("enum").and_then(|e| e.as_array()) {
            if !enum_values.contains(value) {
                let allowed: Vec<String> = enum_values.iter().map(|v| v.to_string()).collect();
                bail!(
                    "invalid parameter '{}': must be one of [{}], got {}",
                    prop_name,
                    allowed.join(", "),
                    value
                );
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert!(registry.find("sap_help_search").is_some());
        assert!(registry.find("sap_help_get").is_some());
        assert!(registry.find("search").is_none());
    }

    #[test]
    fn test_validate_missing_required() {
        let schema = GetTool.parameters_schema();
        let err = validate_params(&schema, &json!({})).unwrap_err();
        assert!(err.to_string().contains("missing required parameter: result_id"));
    }

    #[test]
    fn test_validate_wrong_type() {
        let schema = GetTool.parameters_schema();
        let err = validate_params(&schema, &json!({ "result_id": 5 })).unwrap_err();
        assert!(err.to_string().contains("must be of type 'string'"));
    }

    #[test]
    fn test_validate_enum() {
        let schema = GetTool.parameters_schema();
        let err = validate_params(
            &schema,
            &json!({ "result_id": "sap-help-x", "strategy": "middle" }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be one of"));
    }

    #[test]
    fn test_validate_null_params() {
        let schema = json!({ "type": "object", "properties": { "a": { "type": "string", "default": "x" } } });
        let params = validate_params(&schema, &Value::Null).unwrap();
        assert_eq!(params, json!({ "a": "x" }));
    }
}
