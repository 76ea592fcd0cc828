//! Builder assembling every enabled resource collector

use crate::collectors::clients::{ClientFactory, RemoteClients};
use crate::collectors::cluster::ClusterResourceCollector;
use crate::collectors::node::NodeResourceCollector;
use crate::collectors::refresh::{RefreshLoop, DEFAULT_INTERVAL};
use crate::collectors::ResourceCollector;
use crate::metrics::{AllowDenyList, MetricsStore, StoreCollector};
use crate::{BoardError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use prometheus::core::Collector;
use prometheus::Registry;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectorKind {
    ClusterResource,
    NodeResource,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 2] = [
        CollectorKind::ClusterResource,
        CollectorKind::NodeResource,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollectorKind::ClusterResource => "clusterresource",
            CollectorKind::NodeResource => "noderesource",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectorKind {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        CollectorKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| BoardError::ConfigError(format!("collector {} is not correct", s)))
    }
}

enum Refresh {
    Pending(BoxFuture<'static, ()>),
    Running(JoinHandle<()>),
}

/// A registrable collector together with the loop refreshing its store.
///
/// The loop does not run until the unit is spawned or registered.
pub struct CollectorUnit {
    kind: CollectorKind,
    collector: Box<dyn Collector>,
    refresh: Refresh,
}

impl CollectorUnit {
    pub fn kind(&self) -> CollectorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn collector(&self) -> &dyn Collector {
        self.collector.as_ref()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.refresh, Refresh::Running(_))
    }

    /// Start the refresh loop. Spawning a running unit is a no-op.
    pub fn spawn(mut self) -> Self {
        self.refresh = match self.refresh {
            Refresh::Pending(refresh) => Refresh::Running(tokio::spawn(refresh)),
            running => running,
        };
        self
    }

    /// Register with `registry`, then start the refresh loop if it is not
    /// running yet, handing back its task
    pub fn register(self, registry: &Registry) -> Result<JoinHandle<()>> {
        registry.register(self.collector)?;
        Ok(match self.refresh {
            Refresh::Pending(refresh) => tokio::spawn(refresh),
            Refresh::Running(task) => task,
        })
    }
}

struct PendingUnit {
    kind: CollectorKind,
    collector: Box<dyn Collector>,
    refresh: BoxFuture<'static, ()>,
}

pub struct Builder {
    apiserver: Option<String>,
    kubeconfig: Option<PathBuf>,
    namespaces: Vec<String>,
    prometheus: String,
    enabled_collectors: Vec<String>,
    build_all_collectors: bool,
    allow_deny_list: Option<AllowDenyList>,
    interval: Duration,
    clients: Option<Arc<dyn ClientFactory>>,
    shutdown: CancellationToken,
}

impl Builder {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            apiserver: None,
            kubeconfig: None,
            namespaces: Vec::new(),
            prometheus: DEFAULT_PROMETHEUS_URL.to_string(),
            enabled_collectors: Vec::new(),
            build_all_collectors: false,
            allow_deny_list: None,
            interval: DEFAULT_INTERVAL,
            clients: None,
            shutdown,
        }
    }

    pub fn with_apiserver(mut self, apiserver: impl Into<String>) -> Self {
        self.apiserver = Some(apiserver.into());
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(kubeconfig.into());
        self
    }

    /// Namespace scope. Accepted for compatibility; neither collector is
    /// namespaced.
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_prometheus(mut self, prometheus: impl Into<String>) -> Self {
        self.prometheus = prometheus.into();
        self
    }

    pub fn with_enabled_collectors<I, S>(mut self, collectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = collectors.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        self.enabled_collectors = names;
        self
    }

    /// Build every known collector regardless of the enabled list
    pub fn with_build_all_collectors(mut self, build_all: bool) -> Self {
        self.build_all_collectors = build_all;
        self
    }

    pub fn with_allow_deny_list(mut self, list: AllowDenyList) -> Self {
        self.allow_deny_list = Some(list);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replace the clients built from the prometheus/apiserver/kubeconfig settings
    pub fn with_client_factory(mut self, clients: Arc<dyn ClientFactory>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Collector kinds `build` would assemble
    pub fn active_kinds(&self) -> Result<Vec<CollectorKind>> {
        if self.build_all_collectors {
            return Ok(CollectorKind::ALL.to_vec());
        }

        let mut kinds = self
            .enabled_collectors
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<CollectorKind>>>()?;
        kinds.sort();
        Ok(kinds)
    }

    /// Assemble the enabled collectors.
    ///
    /// No refresh loop is started here; see [`CollectorUnit::register`].
    pub fn build(&self) -> Result<Vec<CollectorUnit>> {
        let filter = self.allow_deny_list.as_ref().ok_or_else(|| {
            BoardError::ConfigError("metric allow/deny list must be set".to_string())
        })?;
        let kinds = self.active_kinds()?;

        if kinds.is_empty() {
            warn!("No collectors enabled");
        }

        let clients: Arc<dyn ClientFactory> = match &self.clients {
            Some(clients) => clients.clone(),
            None => Arc::new(RemoteClients::new(
                self.prometheus.clone(),
                self.apiserver.clone(),
                self.kubeconfig.clone(),
            )),
        };

        let pending = kinds
            .iter()
            .map(|kind| match kind {
                CollectorKind::ClusterResource => {
                    self.assemble(*kind, ClusterResourceCollector, filter, &clients)
                }
                CollectorKind::NodeResource => {
                    self.assemble(*kind, NodeResourceCollector, filter, &clients)
                }
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let names: Vec<&str> = pending.iter().map(|unit| unit.kind.name()).collect();
        info!("Active collectors: {}", names.join(","));

        Ok(pending
            .into_iter()
            .map(|unit| CollectorUnit {
                kind: unit.kind,
                collector: unit.collector,
                refresh: Refresh::Pending(unit.refresh),
            })
            .collect())
    }

    fn assemble<C: ResourceCollector>(
        &self,
        kind: CollectorKind,
        collector: C,
        filter: &AllowDenyList,
        clients: &Arc<dyn ClientFactory>,
    ) -> Result<Option<PendingUnit>> {
        let families = filter.filter_families(&C::families());
        if families.is_empty() {
            info!("{}: every metric family is filtered out, skipping", kind);
            return Ok(None);
        }

        let store = Arc::new(MetricsStore::new(families));
        let exposed = StoreCollector::new(store.clone())?;

        let refresh = RefreshLoop::new(
            kind.name(),
            collector,
            store,
            clients.clone(),
            self.interval,
        );

        Ok(Some(PendingUnit {
            kind,
            collector: Box::new(exposed),
            refresh: refresh.run(self.shutdown.clone()).boxed(),
        }))
    }
}
