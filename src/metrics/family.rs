//! Metric and metric family model
//!
//! A [`FamilyGenerator`] is bound to one domain object type at registration
//! time, so generation never needs to inspect or downcast its input.

/// A single exposed value with positionally paired label keys and values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metric {
    pub label_keys: Vec<String>,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Metric {
    /// Create a metric without labels
    pub fn unlabeled(value: f64) -> Self {
        Self {
            label_keys: Vec::new(),
            label_values: Vec::new(),
            value,
        }
    }

    /// Append a label, or overwrite the value in place if `key` is already set
    pub fn push_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.label_keys.iter().position(|k| *k == key) {
            Some(i) => self.label_values[i] = value,
            None => {
                self.label_keys.push(key);
                self.label_values.push(value);
            }
        }
    }

    /// Value of the label named `key`
    pub fn label(&self, key: &str) -> Option<&str> {
        self.label_keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
}

/// Domain objects stored under a stable identity key
pub trait Identified {
    fn identity(&self) -> &str;
}

/// Named, typed family of metrics generated from a domain object `T`
pub struct FamilyGenerator<T> {
    pub name: &'static str,
    pub help: &'static str,
    pub metric_type: MetricType,
    pub generate: fn(&T) -> Vec<Metric>,
}

impl<T> FamilyGenerator<T> {
    pub fn gauge(
        name: &'static str,
        help: &'static str,
        generate: fn(&T) -> Vec<Metric>,
    ) -> Self {
        Self {
            name,
            help,
            metric_type: MetricType::Gauge,
            generate,
        }
    }
}

// Derived impls would require `T: Clone`.
impl<T> Clone for FamilyGenerator<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            help: self.help,
            metric_type: self.metric_type,
            generate: self.generate,
        }
    }
}

impl<T> std::fmt::Debug for FamilyGenerator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyGenerator")
            .field("name", &self.name)
            .field("metric_type", &self.metric_type)
            .finish()
    }
}
