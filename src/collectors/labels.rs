//! Label shaping and node name enrichment

use crate::k8s::NodeDirectory;
use crate::metrics::Metric;
use crate::prom::Sample;
use std::collections::BTreeMap;

pub const INSTANCE_LABEL: &str = "instance";
pub const NODE_NAME_LABEL: &str = "nodename_for_board";

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn sanitize_label_name(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Exposition key for an arbitrary externally sourced label
pub fn prefix_label(key: &str) -> String {
    format!("label_{}", sanitize_label_name(key))
}

/// Convert arbitrary key/value labels into prefixed label keys and values
pub fn labels_to_metric_labels(labels: &BTreeMap<String, String>) -> (Vec<String>, Vec<String>) {
    labels
        .iter()
        .map(|(k, v)| (prefix_label(k), v.clone()))
        .unzip()
}

/// Map `host:port` to the name of the node owning `host`.
///
/// Falls back to `addr` unchanged when there is no directory or no entry.
pub fn address_to_name(addr: &str, directory: Option<&NodeDirectory>) -> String {
    let Some(directory) = directory else {
        return addr.to_string();
    };

    let host = addr.split(':').next().unwrap_or(addr);
    directory
        .lookup(host)
        .map(str::to_string)
        .unwrap_or_else(|| addr.to_string())
}

/// Turn a query sample into a metric carrying the sample's own labels.
///
/// Keys that sanitize to the same name collapse into one label; the last in
/// key order wins.
pub fn sample_to_metric(sample: &Sample) -> Metric {
    let mut metric = Metric::unlabeled(sample.value);
    for (k, v) in &sample.labels {
        metric.push_label(sanitize_label_name(k), v.clone());
    }
    metric
}

/// Append a node name label to every metric that carries an instance label.
///
/// Existing labels are left in place and in order; a node name label already
/// present is overwritten. Without a directory the metrics are returned
/// untouched.
pub fn add_node_name(mut metrics: Vec<Metric>, directory: Option<&NodeDirectory>) -> Vec<Metric> {
    if directory.is_none() {
        return metrics;
    }

    for metric in &mut metrics {
        if let Some(instance) = metric.label(INSTANCE_LABEL) {
            let name = address_to_name(instance, directory);
            metric.push_label(NODE_NAME_LABEL, name);
        }
    }

    metrics
}
