//! Allow/deny list deciding which metric families are exposed

use crate::metrics::family::FamilyGenerator;
use crate::{BoardError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Allow,
    Deny,
}

/// Either an allow list or a deny list of family names, never both
#[derive(Debug, Clone)]
pub struct AllowDenyList {
    mode: Mode,
    names: HashSet<String>,
}

impl AllowDenyList {
    /// Build a filter. An empty allow list together with an empty deny list
    /// admits every family.
    pub fn new<A, D>(allow: A, deny: D) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let allow: HashSet<String> = allow.into_iter().map(Into::into).collect();
        let deny: HashSet<String> = deny.into_iter().map(Into::into).collect();

        if !allow.is_empty() && !deny.is_empty() {
            return Err(BoardError::ConfigError(
                "metric allow list and deny list are mutually exclusive".to_string(),
            ));
        }

        if allow.is_empty() {
            Ok(Self {
                mode: Mode::Deny,
                names: deny,
            })
        } else {
            Ok(Self {
                mode: Mode::Allow,
                names: allow,
            })
        }
    }

    /// Filter that admits everything
    pub fn allow_all() -> Self {
        Self {
            mode: Mode::Deny,
            names: HashSet::new(),
        }
    }

    pub fn is_included(&self, name: &str) -> bool {
        match self.mode {
            Mode::Allow => self.names.contains(name),
            Mode::Deny => !self.names.contains(name),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        !self.is_included(name)
    }

    /// Keep only the families this filter admits, preserving their order
    pub fn filter_families<T>(&self, families: &[FamilyGenerator<T>]) -> Vec<FamilyGenerator<T>> {
        families
            .iter()
            .filter(|f| self.is_included(f.name))
            .cloned()
            .collect()
    }
}
