//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] to the MCP protocol so agents can list and
//! call the SAP Help tools over stdio or the streamable HTTP endpoint.

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use tracing::info;

use crate::config::Config;
use crate::traits::{ToolContext, ToolRegistry};

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct (everything is behind
/// `Arc`), so all sessions share the same tools and result cache.
#[derive(Clone)]
pub struct McpBridge {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl McpBridge {
    pub fn new(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Self {
        Self { tools, ctx }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn result_text(result: serde_json::Value) -> String {
        match result {
            serde_json::Value::String(text) => text,
            other => serde_json::to_string_pretty(&other).unwrap_or_default(),
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sap-help-mcp".to_string(),
                title: Some("SAP Help Portal".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Search the SAP Help Portal with sap_help_search, then read a page with \
                 sap_help_get using a result id from the search."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let params = match crate::traits::validate_params(&tool.parameters_schema(), &params) {
            Ok(p) => p,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        };

        match tool.execute(params, &self.ctx).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(
                Self::result_text(result),
            )])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

/// Serve the MCP protocol over stdin/stdout until the client disconnects.
pub async fn run_stdio(config: &Config) -> Result<()> {
    let ctx = ToolContext::from_config(Arc::new(config.clone()))?;
    let bridge = McpBridge::new(Arc::new(ToolRegistry::with_builtins()), ctx);

    info!("MCP server listening on stdio");
    let service = bridge.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
