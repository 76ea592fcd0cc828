//! Address to node name lookup, rebuilt on every refresh cycle

use crate::k8s::client::NodeLister;
use crate::k8s::types::NodeInfo;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDirectory {
    by_address: HashMap<String, String>,
}

impl NodeDirectory {
    pub fn from_nodes(nodes: &[NodeInfo]) -> Self {
        let by_address = nodes
            .iter()
            .flat_map(|node| {
                node.addresses
                    .iter()
                    .map(move |addr| (addr.clone(), node.name.clone()))
            })
            .collect();

        Self { by_address }
    }

    /// List nodes and index them by address. `None` when the listing
    /// fails; callers skip enrichment rather than abort.
    pub async fn build(lister: &dyn NodeLister) -> Option<Self> {
        match lister.list_nodes().await {
            Ok(nodes) => {
                let directory = Self::from_nodes(&nodes);
                debug!(
                    "Node directory built: {} nodes, {} addresses",
                    nodes.len(),
                    directory.len()
                );
                Some(directory)
            }
            Err(e) => {
                warn!("List kubernetes nodes error: {}", e);
                None
            }
        }
    }

    pub fn lookup(&self, address: &str) -> Option<&str> {
        self.by_address.get(address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodeDirectory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            by_address: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
