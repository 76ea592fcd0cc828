use async_trait::async_trait;
use board_metrics::collectors::cluster::{
    CLUSTER_CPU_UTILIZATION_QUERY, CLUSTER_IDENTITY, CLUSTER_MEMORY_UTILIZATION_QUERY,
};
use board_metrics::collectors::labels::NODE_NAME_LABEL;
use board_metrics::collectors::node::{
    NODE_CPU_UTILIZATION_QUERY, NODE_IDENTITY, NODE_MEMORY_UTILIZATION_QUERY,
    NODE_STORAGE_UTILIZATION_QUERY,
};
use board_metrics::collectors::refresh::DEFAULT_INTERVAL;
use board_metrics::collectors::{
    Builder, ClientFactory, ClusterResourceCollector, ClusterValue, NodeResourceCollector,
    RefreshLoop, ResourceCollector,
};
use board_metrics::error::{BoardError, Result};
use board_metrics::k8s::{NodeInfo, NodeLister};
use board_metrics::metrics::{AllowDenyList, Metric, MetricsStore};
use board_metrics::prom::client::{SampleValue, VectorSample};
use board_metrics::prom::{QueryApi, QueryData, QueryResponse};
use prometheus::{Registry, TextEncoder};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

type Series = Vec<(Vec<(&'static str, &'static str)>, f64)>;

#[derive(Clone, Default)]
struct FakeQueries {
    vectors: HashMap<&'static str, Series>,
}

#[async_trait]
impl QueryApi for FakeQueries {
    async fn query(&self, query: &str, _time: SystemTime) -> Result<QueryResponse> {
        let series = self
            .vectors
            .get(query)
            .ok_or_else(|| BoardError::QueryFailed {
                query: query.to_string(),
                reason: "connection refused".to_string(),
            })?;

        let samples = series
            .iter()
            .map(|(labels, value)| VectorSample {
                metric: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
                value: SampleValue(0.0, value.to_string()),
            })
            .collect();

        Ok(QueryResponse {
            data: QueryData::Vector(samples),
            warnings: Vec::new(),
        })
    }
}

struct FakeNodes(Option<Vec<NodeInfo>>);

#[async_trait]
impl NodeLister for FakeNodes {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        self.0
            .clone()
            .ok_or_else(|| BoardError::KubernetesError("Failed to list nodes: forbidden".to_string()))
    }
}

#[derive(Default)]
struct FakeState {
    queries: FakeQueries,
    nodes: Option<Vec<NodeInfo>>,
    query_client_broken: bool,
}

/// Clients whose answers can be changed between refresh cycles
#[derive(Clone, Default)]
struct FakeClients {
    state: Arc<Mutex<FakeState>>,
}

impl FakeClients {
    fn with_nodes(nodes: Vec<NodeInfo>) -> Self {
        let clients = Self::default();
        clients.state.lock().unwrap().nodes = Some(nodes);
        clients
    }

    fn set_vector(&self, query: &'static str, series: Series) {
        self.state
            .lock()
            .unwrap()
            .queries
            .vectors
            .insert(query, series);
    }

    fn fail_node_listing(&self) {
        self.state.lock().unwrap().nodes = None;
    }

    fn break_query_client(&self) {
        self.state.lock().unwrap().query_client_broken = true;
    }
}

#[async_trait]
impl ClientFactory for FakeClients {
    fn query_api(&self) -> Result<Box<dyn QueryApi>> {
        let state = self.state.lock().unwrap();
        if state.query_client_broken {
            return Err(BoardError::ConfigError("Invalid Prometheus address".to_string()));
        }
        Ok(Box::new(state.queries.clone()))
    }

    async fn node_lister(&self) -> Result<Box<dyn NodeLister>> {
        let nodes = self.state.lock().unwrap().nodes.clone();
        Ok(Box::new(FakeNodes(nodes)))
    }
}

fn node_a() -> Vec<NodeInfo> {
    vec![NodeInfo::new("node-a", &["10.0.0.5", "node-a.local"])]
}

fn scrape(registry: &Registry) -> String {
    TextEncoder::new().encode_to_string(&registry.gather()).unwrap()
}

#[tokio::test]
async fn test_cluster_failed_queries_default_to_zero() {
    let clients = FakeClients::default();

    let values = ClusterResourceCollector.acquire(&clients).await;

    assert_eq!(values, vec![ClusterValue::new(0.0, 0.0)]);
    assert!(values[0].cpu.label_keys.is_empty());
    assert!(values[0].memory.label_keys.is_empty());
}

#[tokio::test]
async fn test_cluster_takes_first_sample() {
    let clients = FakeClients::default();
    clients.set_vector(
        CLUSTER_CPU_UTILIZATION_QUERY,
        vec![(vec![], 0.25), (vec![("shard", "b")], 0.75)],
    );
    clients.set_vector(CLUSTER_MEMORY_UTILIZATION_QUERY, vec![(vec![], 0.5)]);

    let values = ClusterResourceCollector.acquire(&clients).await;

    assert_eq!(values, vec![ClusterValue::new(0.25, 0.5)]);
}

#[tokio::test]
async fn test_cluster_client_failure_yields_nothing() {
    let clients = FakeClients::default();
    clients.break_query_client();

    assert!(ClusterResourceCollector.acquire(&clients).await.is_empty());
}

#[tokio::test]
async fn test_node_metrics_are_enriched() {
    let clients = FakeClients::with_nodes(node_a());
    clients.set_vector(
        NODE_CPU_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.42)],
    );

    let values = NodeResourceCollector.acquire(&clients).await;
    assert_eq!(values.len(), 1);

    let mut expected = Metric::unlabeled(0.42);
    expected.push_label("instance", "10.0.0.5:9100");
    expected.push_label(NODE_NAME_LABEL, "node-a");
    assert_eq!(values[0].cpu, vec![expected]);
}

#[tokio::test]
async fn test_node_unknown_instance_keeps_address() {
    let clients = FakeClients::with_nodes(node_a());
    clients.set_vector(
        NODE_MEMORY_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.9:9100")], 0.3)],
    );

    let values = NodeResourceCollector.acquire(&clients).await;

    assert_eq!(values[0].memory[0].label(NODE_NAME_LABEL), Some("10.0.0.9:9100"));
}

#[tokio::test]
async fn test_node_query_failures_are_independent() {
    let clients = FakeClients::with_nodes(node_a());
    clients.set_vector(
        NODE_CPU_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.42)],
    );
    clients.set_vector(
        NODE_STORAGE_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.61)],
    );

    let values = NodeResourceCollector.acquire(&clients).await;

    assert_eq!(values[0].cpu.len(), 1);
    assert!(values[0].memory.is_empty());
    assert_eq!(values[0].storage[0].value, 0.61);
}

#[tokio::test]
async fn test_node_listing_failure_leaves_store_untouched() {
    let clients = FakeClients::with_nodes(node_a());
    clients.set_vector(
        NODE_CPU_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.42)],
    );

    let store = Arc::new(MetricsStore::new(NodeResourceCollector::families()));
    let refresh = RefreshLoop::new(
        "noderesource",
        NodeResourceCollector,
        store.clone(),
        Arc::new(clients.clone()),
        DEFAULT_INTERVAL,
    );

    assert_eq!(refresh.refresh_once().await, 1);
    let before = store.get(NODE_IDENTITY).expect("node values stored");

    clients.fail_node_listing();
    clients.set_vector(
        NODE_CPU_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.99)],
    );
    assert_eq!(refresh.refresh_once().await, 0);

    let after = store.get(NODE_IDENTITY).expect("node values still stored");
    assert_eq!(before, after);
    assert_eq!(after[0][0].value, 0.42);
}

#[tokio::test]
async fn test_refresh_keeps_only_latest_result() {
    let clients = FakeClients::default();
    clients.set_vector(CLUSTER_CPU_UTILIZATION_QUERY, vec![(vec![], 0.1)]);

    let store = Arc::new(MetricsStore::new(ClusterResourceCollector::families()));
    let refresh = RefreshLoop::new(
        "clusterresource",
        ClusterResourceCollector,
        store.clone(),
        Arc::new(clients.clone()),
        DEFAULT_INTERVAL,
    );

    refresh.refresh_once().await;
    clients.set_vector(CLUSTER_CPU_UTILIZATION_QUERY, vec![(vec![], 0.2)]);
    refresh.refresh_once().await;

    assert_eq!(store.len(), 1);
    let generated = store.get(CLUSTER_IDENTITY).unwrap();
    assert_eq!(generated[0], vec![Metric::unlabeled(0.2)]);
}

#[test]
fn test_builder_requires_filter() {
    let result = Builder::new(CancellationToken::new())
        .with_build_all_collectors(true)
        .with_client_factory(Arc::new(FakeClients::default()))
        .build();

    assert!(matches!(result, Err(BoardError::ConfigError(_))));
}

#[tokio::test(start_paused = true)]
async fn test_builder_end_to_end() {
    let clients = FakeClients::with_nodes(node_a());
    clients.set_vector(CLUSTER_CPU_UTILIZATION_QUERY, vec![(vec![], 0.25)]);
    clients.set_vector(CLUSTER_MEMORY_UTILIZATION_QUERY, vec![(vec![], 0.5)]);
    clients.set_vector(
        NODE_CPU_UTILIZATION_QUERY,
        vec![(vec![("instance", "10.0.0.5:9100")], 0.42)],
    );

    let shutdown = CancellationToken::new();
    let units = Builder::new(shutdown.clone())
        .with_build_all_collectors(true)
        .with_allow_deny_list(
            AllowDenyList::new(Vec::<String>::new(), ["board_cluster_memory_utilization"])
                .unwrap(),
        )
        .with_client_factory(Arc::new(clients.clone()))
        .build()
        .unwrap();

    let names: Vec<&str> = units.iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["clusterresource", "noderesource"]);

    let registry = Registry::new();
    let tasks: Vec<_> = units
        .into_iter()
        .map(|u| u.register(&registry).unwrap())
        .collect();

    tokio::time::sleep(Duration::from_millis(10)).await;
    let text = scrape(&registry);

    assert!(text.contains("board_cluster_cpu_utilization 0.25"));
    assert!(!text.contains("board_cluster_memory_utilization"));
    assert!(text.contains(
        "board_node_cpu_utilization{instance=\"10.0.0.5:9100\",nodename_for_board=\"node-a\"} 0.42"
    ));

    // A failed node listing keeps the previous node metrics visible.
    clients.fail_node_listing();
    clients.set_vector(CLUSTER_CPU_UTILIZATION_QUERY, vec![(vec![], 0.3)]);
    tokio::time::sleep(DEFAULT_INTERVAL).await;
    let text = scrape(&registry);

    assert!(text.contains("board_cluster_cpu_utilization 0.3"));
    assert!(text.contains("nodename_for_board=\"node-a\"} 0.42"));

    shutdown.cancel();
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_builder_honours_enabled_collectors() {
    let shutdown = CancellationToken::new();
    let units = Builder::new(shutdown.clone())
        .with_enabled_collectors(["noderesource"])
        .with_allow_deny_list(AllowDenyList::allow_all())
        .with_client_factory(Arc::new(FakeClients::default()))
        .build()
        .unwrap();

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name(), "noderesource");

    shutdown.cancel();
}

#[test]
fn test_error_types() {
    let err = BoardError::UnexpectedResultType {
        query: "up".to_string(),
        result_type: "matrix".to_string(),
    };

    assert!(err.to_string().contains("up"));
    assert!(err.to_string().contains("matrix"));
}

#[test]
fn test_version_const() {
    assert!(!board_metrics::VERSION.is_empty());
}
