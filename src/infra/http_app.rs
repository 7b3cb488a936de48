use axum::{
    routing::{any_service, get},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::mcp_router::make_factory;
use crate::tools::registry::CapabilityRegistry;

/// `/healthz` + streamable MCP at `/mcp`.
pub fn build_app(registry: Arc<CapabilityRegistry>) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(make_factory(registry), session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}
