use crate::collectors::Builder;
use crate::config::Config;
use crate::metrics::PrometheusExporter;
use crate::Result;
use prometheus::Registry;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Start every enabled collector and serve them until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    let shutdown = CancellationToken::new();

    let mut builder = Builder::new(shutdown.clone())
        .with_prometheus(config.prometheus_url.clone())
        .with_namespaces(config.namespaces.clone())
        .with_enabled_collectors(config.collectors.clone())
        .with_build_all_collectors(config.build_all_collectors)
        .with_allow_deny_list(config.allow_deny_list()?)
        .with_interval(config.interval());
    if let Some(apiserver) = &config.apiserver {
        builder = builder.with_apiserver(apiserver.clone());
    }
    if let Some(kubeconfig) = &config.kubeconfig {
        builder = builder.with_kubeconfig(kubeconfig.clone());
    }

    let registry = Registry::new();
    #[cfg(target_os = "linux")]
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;

    let mut tasks = Vec::new();
    for unit in builder.build()? {
        info!("Registering {} collector", unit.name());
        tasks.push(unit.register(&registry)?);
    }

    let exporter = PrometheusExporter::new(registry, config.listen_addr()?);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    let served = exporter.serve(shutdown.clone()).await;
    shutdown.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            warn!("Refresh task ended abnormally: {}", e);
        }
    }

    served
}
