//! Resource collectors turning query results into exposed gauges

pub mod builder;
pub mod clients;
pub mod cluster;
pub mod labels;
pub mod node;
pub mod refresh;

pub use builder::{Builder, CollectorKind, CollectorUnit};
pub use clients::{ClientFactory, RemoteClients};
pub use cluster::{ClusterResourceCollector, ClusterValue};
pub use node::{NodeResourceCollector, NodeValues};
pub use refresh::RefreshLoop;

use crate::metrics::{FamilyGenerator, Identified};
use async_trait::async_trait;

/// A source of domain objects and the families rendered from them
#[async_trait]
pub trait ResourceCollector: Send + Sync + 'static {
    type Value: Identified + Send + Sync + 'static;

    fn families() -> Vec<FamilyGenerator<Self::Value>>;

    /// Fetch this cycle's objects. An empty result means "nothing new".
    async fn acquire(&self, clients: &dyn ClientFactory) -> Vec<Self::Value>;
}
