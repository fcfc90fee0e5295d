//! HTTP server: JSON tool API plus the MCP streamable HTTP endpoint.
//!
//! All tools are registered in a [`ToolRegistry`] and dispatched through
//! the same `POST /tools/{name}` handler. The same registry and result
//! cache back the MCP endpoint, so a search made over one surface can be
//! followed by a `get` over the other.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//! | any    | `/mcp` | MCP streamable HTTP transport |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::mcp::McpBridge;
use crate::traits::{validate_params, ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

/// Starts the HTTP server with the built-in tools against the live portal.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let ctx = ToolContext::from_config(Arc::new(config.clone()))?;
    let tools = Arc::new(ToolRegistry::with_builtins());
    let app = router(tools.clone(), ctx);

    for t in tools.tools() {
        info!("POST /tools/{} ({})", t.name(), t.description());
    }
    info!("HTTP server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router for a tool registry and context.
pub fn router(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Router {
    let bridge = McpBridge::new(tools.clone(), ctx.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { tools, ctx })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Map tool failures to a status by message, so tools can signal client
/// errors without a custom error type in the `Tool` trait.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("not found") {
        not_found(format!("{}: {}", tool_name, msg))
    } else if msg.contains("must not be empty") || msg.contains("invalid") {
        bad_request(format!("{}: {}", tool_name, msg))
    } else {
        tool_error(format!("{}: {}", tool_name, msg))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.infos(),
    })
}

// ============ POST /tools/{name} ============

/// Looks up the tool, validates parameters against its schema, executes it
/// and wraps the value as `{ "result": ... }`.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let validated_params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    let result = tool
        .execute(validated_params, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = classify_tool_error(
            "sap_help_get",
            anyhow::anyhow!("Failed to get SAP Help page content: SAP Help document not found: x"),
        );
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_classify_malformed_id() {
        let err = classify_tool_error(
            "sap_help_get",
            anyhow::anyhow!("Failed to get SAP Help page content: invalid SAP Help result id 'x'"),
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_classify_empty_re_search() {
        let err = classify_tool_error(
            "sap_help_get",
            anyhow::anyhow!(
                "Failed to get SAP Help page content: {}",
                crate::error::DocsError::EmptySearch("abc123".to_string())
            ),
        );
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_classify_unparsable_url_is_upstream() {
        let err = classify_tool_error(
            "sap_help_get",
            anyhow::anyhow!(
                "Failed to get SAP Help page content: {}",
                crate::error::DocsError::UnparsableDocumentUrl("/viewer/x.html".to_string())
            ),
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_classify_remote_failure() {
        let err = classify_tool_error(
            "sap_help_search",
            anyhow::anyhow!("SAP Help search failed: SAP Help search request failed: 503 Service Unavailable"),
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "tool_error");
    }
}
