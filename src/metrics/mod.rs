pub mod collector;
pub mod exporter;
pub mod family;
pub mod filter;
pub mod store;

pub use collector::StoreCollector;
pub use exporter::PrometheusExporter;
pub use family::{FamilyGenerator, Identified, Metric, MetricType};
pub use filter::AllowDenyList;
pub use store::MetricsStore;
