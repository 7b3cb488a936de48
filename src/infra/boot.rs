use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::solvedac::SolvedAcClient;
use crate::infra::config::Config;
use crate::infra::runtime::lifecycle::RemoteClientHandle;
use crate::tools::mcp_router::SolvedAcSvc;
use crate::tools::registry::CapabilityRegistry;
use crate::tools::solvedac::build_registry;

/// Handle plus registry wired for one process.
pub fn wire(cfg: &Config) -> (RemoteClientHandle, Arc<CapabilityRegistry>) {
    let handle = RemoteClientHandle::new(cfg.remote.clone());
    let registry = Arc::new(build_registry(SolvedAcClient::new(handle.clone())));
    (handle, registry)
}

/// Activate the client, run the configured transport, then close the client
/// on every exit path.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        base_url = %cfg.remote.base_url,
        "BOOT solvedac-mcp-gateway"
    );

    let (handle, registry) = wire(&cfg);
    let _scope = handle.scope()?;

    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(SolvedAcSvc::new(registry))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(registry);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
