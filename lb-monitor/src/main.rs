use std::sync::Arc;

use lb_monitor::api::{ApiServer, AppState};
use lb_monitor::config::MonitorConfig;
use lb_monitor::logging;
use lb_monitor::metrics::{ConnectionCounter, NodeMetrics, SystemSampler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env()?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;

    let cancel_token = CancellationToken::new();
    let metrics = Arc::new(NodeMetrics::new());

    let sampler = Arc::new(SystemSampler::new());
    let sampler_task = sampler.start(config.sample_interval, cancel_token.child_token());

    let reset_task = config
        .conn_reset_interval
        .map(|period| metrics.start_conn_reset(period, cancel_token.child_token()));

    // The proxy embedding this node holds `metrics` and `connections` and
    // feeds them: `connection_opened`/`connection_closed` per client,
    // `record_request` per request and `record_upstream_connection_delta` per
    // upstream connection. Standalone, only the resource gauges move.
    let connections = Arc::new(ConnectionCounter::new());
    let state = AppState::new(metrics, sampler, connections);
    let server = ApiServer::with_state(config.api, state);

    let server_token = server.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                server_token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    info!(
        sample_interval_secs = config.sample_interval.as_secs(),
        "lb-monitor started"
    );
    server.run().await?;

    cancel_token.cancel();
    let _ = sampler_task.await;
    if let Some(task) = reset_task {
        let _ = task.await;
    }

    Ok(())
}
