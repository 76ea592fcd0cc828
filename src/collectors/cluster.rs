//! Cluster-wide CPU and memory utilization

use crate::collectors::clients::ClientFactory;
use crate::collectors::ResourceCollector;
use crate::metrics::{FamilyGenerator, Identified, Metric};
use crate::prom::QueryAdapter;
use async_trait::async_trait;
use tracing::warn;

pub const CLUSTER_CPU_UTILIZATION_QUERY: &str =
    r#"1-avg(rate(node_cpu_seconds_total{mode="idle"}[5m]))"#;
pub const CLUSTER_MEMORY_UTILIZATION_QUERY: &str = "1 - sum(:node_memory_MemAvailable_bytes:sum{}) / sum(kube_node_status_allocatable_memory_bytes{})";

pub const CLUSTER_IDENTITY: &str = "cluster_utilization";

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterValue {
    pub cpu: Metric,
    pub memory: Metric,
}

impl ClusterValue {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            cpu: Metric::unlabeled(cpu),
            memory: Metric::unlabeled(memory),
        }
    }
}

impl Identified for ClusterValue {
    fn identity(&self) -> &str {
        CLUSTER_IDENTITY
    }
}

pub struct ClusterResourceCollector;

#[async_trait]
impl ResourceCollector for ClusterResourceCollector {
    type Value = ClusterValue;

    fn families() -> Vec<FamilyGenerator<ClusterValue>> {
        vec![
            FamilyGenerator::gauge(
                "board_cluster_cpu_utilization",
                "Cluster CPU Utilization",
                |c: &ClusterValue| vec![c.cpu.clone()],
            ),
            FamilyGenerator::gauge(
                "board_cluster_memory_utilization",
                "Cluster Memory Utilization",
                |c: &ClusterValue| vec![c.memory.clone()],
            ),
        ]
    }

    /// Both families always carry exactly one sample; a failed query reads as 0.
    async fn acquire(&self, clients: &dyn ClientFactory) -> Vec<ClusterValue> {
        let api = match clients.query_api() {
            Ok(api) => api,
            Err(e) => {
                warn!("New prometheus client error: {}", e);
                return Vec::new();
            }
        };
        let adapter = QueryAdapter::new(api.as_ref());

        let cpu = adapter
            .query_single(CLUSTER_CPU_UTILIZATION_QUERY)
            .await
            .unwrap_or(0.0);
        let memory = adapter
            .query_single(CLUSTER_MEMORY_UTILIZATION_QUERY)
            .await
            .unwrap_or(0.0);

        vec![ClusterValue::new(cpu, memory)]
    }
}
