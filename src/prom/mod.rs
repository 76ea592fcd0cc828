pub mod adapter;
pub mod client;

pub use adapter::{QueryAdapter, Sample};
pub use client::{PrometheusClient, QueryApi, QueryData, QueryResponse};
