pub mod client;
pub mod directory;
pub mod types;

pub use client::{K8sClient, NodeLister};
pub use directory::NodeDirectory;
pub use types::NodeInfo;
