//! Metrics store keyed by domain object identity
//!
//! Each stored object is rendered into its families once, at write time.
//! Writers swap the whole rendered entry for an identity, so a concurrent
//! scrape sees either the previous object or the new one, never a mix.

use crate::metrics::family::{FamilyGenerator, Identified, Metric};
use dashmap::DashMap;
use std::sync::Arc;

/// Metrics generated from one domain object, one entry per family in store order
pub type GeneratedFamilies = Arc<Vec<Vec<Metric>>>;

pub struct MetricsStore<T> {
    families: Vec<FamilyGenerator<T>>,
    inner: DashMap<String, GeneratedFamilies>,
}

impl<T: Identified> MetricsStore<T> {
    /// Create an empty store rendering the given families
    pub fn new(families: Vec<FamilyGenerator<T>>) -> Self {
        Self {
            families,
            inner: DashMap::new(),
        }
    }

    /// Render `obj` and replace whatever was stored under its identity
    pub fn update(&self, obj: &T) {
        let generated = self
            .families
            .iter()
            .map(|family| (family.generate)(obj))
            .collect::<Vec<_>>();

        self.inner
            .insert(obj.identity().to_string(), Arc::new(generated));
    }

    /// Remove the object stored under `identity`
    pub fn delete(&self, identity: &str) -> bool {
        self.inner.remove(identity).is_some()
    }

    /// Drop every stored object and store `objs` instead
    pub fn replace(&self, objs: &[T]) {
        self.inner.clear();
        for obj in objs {
            self.update(obj);
        }
    }

    /// Look up the rendered metrics stored under `identity`
    pub fn get(&self, identity: &str) -> Option<GeneratedFamilies> {
        self.inner.get(identity).map(|r| r.value().clone())
    }

    pub fn families(&self) -> &[FamilyGenerator<T>] {
        &self.families
    }

    /// Number of stored identities
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Metrics of every family across all stored identities.
    ///
    /// Identities are visited in sorted order so repeated scrapes of the
    /// same contents render identically.
    pub fn collect_families(&self) -> Vec<(&FamilyGenerator<T>, Vec<Metric>)> {
        let mut snapshot: Vec<(String, GeneratedFamilies)> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        self.families
            .iter()
            .enumerate()
            .map(|(i, family)| {
                let metrics = snapshot
                    .iter()
                    .filter_map(|(_, generated)| generated.get(i))
                    .flat_map(|m| m.iter().cloned())
                    .collect();
                (family, metrics)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        id: &'static str,
        value: f64,
    }

    impl Identified for Sample {
        fn identity(&self) -> &str {
            self.id
        }
    }

    fn store() -> MetricsStore<Sample> {
        MetricsStore::new(vec![FamilyGenerator::gauge(
            "sample_value",
            "Sample value",
            |s: &Sample| vec![Metric::unlabeled(s.value)],
        )])
    }

    #[test]
    fn test_update_replaces_same_identity() {
        let store = store();

        store.update(&Sample { id: "x", value: 1.0 });
        store.update(&Sample { id: "x", value: 2.0 });

        assert_eq!(store.len(), 1);
        let generated = store.get("x").expect("Should find entry");
        assert_eq!(generated[0], vec![Metric::unlabeled(2.0)]);
    }

    #[test]
    fn test_delete_and_replace() {
        let store = store();

        store.update(&Sample { id: "x", value: 1.0 });
        store.update(&Sample { id: "y", value: 2.0 });
        assert!(store.delete("x"));
        assert!(!store.delete("x"));
        assert_eq!(store.len(), 1);

        store.replace(&[Sample { id: "z", value: 3.0 }]);
        assert!(store.get("y").is_none());
        assert!(store.get("z").is_some());
    }

    #[test]
    fn test_collect_families_concatenates_identities() {
        let store = store();

        store.update(&Sample { id: "b", value: 2.0 });
        store.update(&Sample { id: "a", value: 1.0 });

        let collected = store.collect_families();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].0.name, "sample_value");
        let values: Vec<f64> = collected[0].1.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
