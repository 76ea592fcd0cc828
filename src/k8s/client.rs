use crate::k8s::types::NodeInfo;
use crate::{BoardError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::Path;
use tracing::debug;

/// Lists every node known to the cluster
#[async_trait]
pub trait NodeLister: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>>;
}

pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Connect using `kubeconfig` when given, otherwise the in-cluster or
    /// default configuration. `apiserver` overrides the cluster URL.
    pub async fn connect(apiserver: Option<&str>, kubeconfig: Option<&Path>) -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let mut config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    BoardError::KubernetesError(format!(
                        "Failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| {
                        BoardError::KubernetesError(format!("Invalid kubeconfig: {}", e))
                    })?
            }
            None => Config::infer().await.map_err(|e| {
                BoardError::KubernetesError(format!("Failed to infer K8s config: {}", e))
            })?,
        };

        if let Some(apiserver) = apiserver.filter(|s| !s.is_empty()) {
            config.cluster_url = apiserver.parse().map_err(|e| {
                BoardError::KubernetesError(format!("Invalid apiserver {}: {}", apiserver, e))
            })?;
        }

        let client = Client::try_from(config).map_err(|e| {
            BoardError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        Ok(Self { client })
    }

    pub fn nodes(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl NodeLister for K8sClient {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        let node_list = self
            .nodes()
            .list(&Default::default())
            .await
            .map_err(|e| BoardError::KubernetesError(format!("Failed to list nodes: {}", e)))?;

        Ok(node_list.iter().map(NodeInfo::from_k8s_node).collect())
    }
}
