pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod k8s;
pub mod metrics;
pub mod prom;

pub use error::{BoardError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
