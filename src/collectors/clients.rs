use crate::k8s::{K8sClient, NodeLister};
use crate::prom::{PrometheusClient, QueryApi};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Hands out fresh service clients for each refresh cycle, so that a
/// construction failure only costs that one cycle.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    fn query_api(&self) -> Result<Box<dyn QueryApi>>;

    async fn node_lister(&self) -> Result<Box<dyn NodeLister>>;
}

/// Clients talking to a real Prometheus server and Kubernetes API server
#[derive(Debug, Clone)]
pub struct RemoteClients {
    prometheus: String,
    apiserver: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl RemoteClients {
    pub fn new(
        prometheus: impl Into<String>,
        apiserver: Option<String>,
        kubeconfig: Option<PathBuf>,
    ) -> Self {
        Self {
            prometheus: prometheus.into(),
            apiserver,
            kubeconfig,
        }
    }
}

#[async_trait]
impl ClientFactory for RemoteClients {
    fn query_api(&self) -> Result<Box<dyn QueryApi>> {
        Ok(Box::new(PrometheusClient::new(&self.prometheus)?))
    }

    async fn node_lister(&self) -> Result<Box<dyn NodeLister>> {
        let client =
            K8sClient::connect(self.apiserver.as_deref(), self.kubeconfig.as_deref()).await?;
        Ok(Box::new(client))
    }
}
