use crate::metrics::family::{FamilyGenerator, Identified, Metric, MetricType};
use crate::metrics::store::MetricsStore;
use crate::Result;
use prometheus::core::{Collector, Desc};
use prometheus::proto;
use std::collections::HashMap;
use std::sync::Arc;

/// Exposes the contents of a [`MetricsStore`] to a prometheus registry
pub struct StoreCollector<T> {
    store: Arc<MetricsStore<T>>,
    descs: Vec<Desc>,
}

impl<T: Identified> StoreCollector<T> {
    pub fn new(store: Arc<MetricsStore<T>>) -> Result<Self> {
        let descs = store
            .families()
            .iter()
            .map(family_desc)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { store, descs })
    }
}

impl<T> Collector for StoreCollector<T>
where
    T: Identified + Send + Sync + 'static,
{
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        self.store
            .collect_families()
            .into_iter()
            .filter(|(_, metrics)| !metrics.is_empty())
            .map(|(family, metrics)| to_metric_family(family, &metrics))
            .collect()
    }
}

fn family_desc<T>(family: &FamilyGenerator<T>) -> Result<Desc> {
    let desc = Desc::new(
        family.name.to_string(),
        family.help.to_string(),
        Vec::new(),
        HashMap::new(),
    )?;
    Ok(desc)
}

fn to_metric_family<T>(family: &FamilyGenerator<T>, metrics: &[Metric]) -> proto::MetricFamily {
    let mut mf = proto::MetricFamily::default();
    mf.set_name(family.name.to_string());
    mf.set_help(family.help.to_string());
    mf.set_field_type(match family.metric_type {
        MetricType::Gauge => proto::MetricType::GAUGE,
    });

    for metric in metrics {
        mf.mut_metric().push(to_proto_metric(metric));
    }

    mf
}

fn to_proto_metric(metric: &Metric) -> proto::Metric {
    let mut out = proto::Metric::default();

    let labels: Vec<proto::LabelPair> = metric
        .label_keys
        .iter()
        .zip(&metric.label_values)
        .map(|(key, value)| {
            let mut pair = proto::LabelPair::default();
            pair.set_name(key.clone());
            pair.set_value(value.clone());
            pair
        })
        .collect();
    out.set_label(labels);

    let mut gauge = proto::Gauge::default();
    gauge.set_value(metric.value);
    out.set_gauge(gauge);

    out
}
