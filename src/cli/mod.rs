pub mod commands;

use crate::config::Config;
use crate::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "board-metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cluster and node utilization gauges derived from Prometheus queries", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Prometheus server address")]
    pub prometheus_url: Option<String>,

    #[arg(long, help = "Kubernetes API server address, overriding the kubeconfig")]
    pub apiserver: Option<String>,

    #[arg(long, help = "Path to a kubeconfig file")]
    pub kubeconfig: Option<PathBuf>,

    #[arg(long, value_delimiter = ',', help = "Namespaces to scope to")]
    pub namespaces: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',', help = "Collectors to enable")]
    pub collectors: Option<Vec<String>>,

    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Build every known collector, ignoring --collectors (=false overrides the config file)"
    )]
    pub build_all_collectors: Option<bool>,

    #[arg(long, value_delimiter = ',', help = "Metric families to expose")]
    pub metric_allowlist: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',', help = "Metric families to hide")]
    pub metric_denylist: Option<Vec<String>>,

    #[arg(long, help = "Address to listen on")]
    pub host: Option<String>,

    #[arg(short, long, help = "Port to listen on")]
    pub port: Option<u16>,

    #[arg(long, help = "Seconds between refresh cycles")]
    pub interval_secs: Option<u64>,
}

impl Cli {
    /// Load the configuration file, if any, and apply flag overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.prometheus_url {
            config.prometheus_url = url.clone();
        }
        if let Some(apiserver) = &self.apiserver {
            config.apiserver = Some(apiserver.clone());
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(namespaces) = &self.namespaces {
            config.namespaces = namespaces.clone();
        }
        if let Some(collectors) = &self.collectors {
            config.collectors = collectors.clone();
        }
        if let Some(build_all) = self.build_all_collectors {
            config.build_all_collectors = build_all;
        }
        if let Some(allow) = &self.metric_allowlist {
            config.metric_allowlist = allow.clone();
        }
        if let Some(deny) = &self.metric_denylist {
            config.metric_denylist = deny.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval_secs {
            config.interval_secs = interval;
        }
    }
}
