use k8s_openapi::api::core::v1::Node;
use serde::{Deserialize, Serialize};

/// Name of a node together with every address it reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub addresses: Vec<String>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, addresses: &[&str]) -> Self {
        Self {
            name: name.into(),
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn from_k8s_node(node: &Node) -> Self {
        let addresses = node
            .status
            .as_ref()
            .and_then(|s| s.addresses.as_ref())
            .map(|addrs| addrs.iter().map(|a| a.address.clone()).collect())
            .unwrap_or_default();

        Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            addresses,
        }
    }
}
