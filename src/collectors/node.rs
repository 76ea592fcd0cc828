//! Per-node CPU, memory and filesystem utilization

use crate::collectors::clients::ClientFactory;
use crate::collectors::labels::{add_node_name, sample_to_metric};
use crate::collectors::ResourceCollector;
use crate::k8s::NodeDirectory;
use crate::metrics::{FamilyGenerator, Identified, Metric};
use crate::prom::QueryAdapter;
use async_trait::async_trait;
use tracing::warn;

pub const NODE_CPU_UTILIZATION_QUERY: &str =
    r#"sum by (instance) (instance:node_cpu_utilisation:rate1m{job="node-exporter"})"#;
pub const NODE_MEMORY_UTILIZATION_QUERY: &str =
    r#"sum by (instance) (instance:node_memory_utilisation:ratio{job="node-exporter"})"#;
pub const NODE_STORAGE_UTILIZATION_QUERY: &str = r#"1 -(sum by (instance) (node_filesystem_avail_bytes{job="node-exporter", fstype!="", device!=""})/sum by(instance) (node_filesystem_size_bytes{job="node-exporter", fstype!="", device!=""}))"#;

/// One aggregate object covers every node
pub const NODE_IDENTITY: &str = "node_memory_utilization";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeValues {
    pub cpu: Vec<Metric>,
    pub memory: Vec<Metric>,
    pub storage: Vec<Metric>,
}

impl Identified for NodeValues {
    fn identity(&self) -> &str {
        NODE_IDENTITY
    }
}

pub struct NodeResourceCollector;

#[async_trait]
impl ResourceCollector for NodeResourceCollector {
    type Value = NodeValues;

    fn families() -> Vec<FamilyGenerator<NodeValues>> {
        vec![
            FamilyGenerator::gauge(
                "board_node_cpu_utilization",
                "Node CPU Utilization",
                |n: &NodeValues| n.cpu.clone(),
            ),
            FamilyGenerator::gauge(
                "board_node_memory_utilization",
                "Node Memory Utilization",
                |n: &NodeValues| n.memory.clone(),
            ),
            FamilyGenerator::gauge(
                "board_node_storage_utilization",
                "Node Storage Utilization",
                |n: &NodeValues| n.storage.clone(),
            ),
        ]
    }

    /// Yields nothing when the node listing is unavailable, leaving the
    /// previously stored values in place. Individual query failures only
    /// empty their own family.
    async fn acquire(&self, clients: &dyn ClientFactory) -> Vec<NodeValues> {
        let api = match clients.query_api() {
            Ok(api) => api,
            Err(e) => {
                warn!("New prometheus client error: {}", e);
                return Vec::new();
            }
        };

        let lister = match clients.node_lister().await {
            Ok(lister) => lister,
            Err(e) => {
                warn!("New kubernetes client error: {}", e);
                return Vec::new();
            }
        };

        let Some(directory) = NodeDirectory::build(lister.as_ref()).await else {
            return Vec::new();
        };

        let adapter = QueryAdapter::new(api.as_ref());
        let values = NodeValues {
            cpu: node_metrics(&adapter, NODE_CPU_UTILIZATION_QUERY, &directory).await,
            memory: node_metrics(&adapter, NODE_MEMORY_UTILIZATION_QUERY, &directory).await,
            storage: node_metrics(&adapter, NODE_STORAGE_UTILIZATION_QUERY, &directory).await,
        };

        vec![values]
    }
}

async fn node_metrics(
    adapter: &QueryAdapter<'_>,
    query: &str,
    directory: &NodeDirectory,
) -> Vec<Metric> {
    let metrics: Vec<Metric> = adapter
        .query_vector(query)
        .await
        .unwrap_or_default()
        .iter()
        .map(sample_to_metric)
        .collect();

    add_node_name(metrics, Some(directory))
}
