// metrics/mod.rs
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn setup_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to setup metrics: {}", e))?;
    tracing::info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// `devices` is `None` when the scan failed.
pub fn record_refresh(devices: Option<usize>) {
    match devices {
        Some(count) => {
            ::metrics::counter!("discovery_refresh_total", "outcome" => "ok").increment(1);
            ::metrics::gauge!("registry_devices").set(count as f64);
        }
        None => {
            ::metrics::counter!("discovery_refresh_total", "outcome" => "error").increment(1);
        }
    }
}

pub fn record_dispatch(action: &'static str, succeeded: usize, failed: usize) {
    ::metrics::counter!("dispatch_commands_total", "action" => action, "outcome" => "ok")
        .increment(succeeded as u64);
    ::metrics::counter!("dispatch_commands_total", "action" => action, "outcome" => "error")
        .increment(failed as u64);
}
