//! Query adapter turning query responses into plain samples
//!
//! Failures are logged with the query text and reported as `None`; callers
//! decide which neutral default stands in for the missing value.

use crate::prom::client::{QueryApi, QueryData};
use crate::{BoardError, Result};
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::{info, warn};

/// One labeled sample of a vector result
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

pub struct QueryAdapter<'a> {
    api: &'a dyn QueryApi,
}

impl<'a> QueryAdapter<'a> {
    pub fn new(api: &'a dyn QueryApi) -> Self {
        Self { api }
    }

    /// Run a query expected to yield exactly one sample.
    ///
    /// An empty vector yields `Some(0.0)`. When several samples come back,
    /// all of them are logged and the first one in the order returned by the
    /// server is used; no sorting is applied.
    pub async fn query_single(&self, query: &str) -> Option<f64> {
        let samples = self.query_vector(query).await?;

        if samples.is_empty() {
            info!("Query {} has no result", query);
            return Some(0.0);
        }

        if samples.len() > 1 {
            for sample in &samples {
                info!("Query {} returned multiple results: {:?}", query, sample);
            }
        }

        samples.first().map(|s| s.value)
    }

    /// Run a query expected to yield a vector. An empty vector is a success.
    pub async fn query_vector(&self, query: &str) -> Option<Vec<Sample>> {
        match self.try_query_vector(query).await {
            Ok(samples) => Some(samples),
            Err(e) => {
                warn!("Query {} error: {}", query, e);
                None
            }
        }
    }

    async fn try_query_vector(&self, query: &str) -> Result<Vec<Sample>> {
        let response = self.api.query(query, SystemTime::now()).await?;

        if !response.warnings.is_empty() {
            info!("Query {} warnings: {}", query, response.warnings.join(" "));
        }

        let samples = match response.data {
            QueryData::Vector(samples) => samples,
            other => {
                return Err(BoardError::UnexpectedResultType {
                    query: query.to_string(),
                    result_type: other.result_type().to_string(),
                })
            }
        };

        samples
            .into_iter()
            .map(|s| {
                Ok(Sample {
                    value: s.value.parse()?,
                    labels: s.metric,
                })
            })
            .collect()
    }
}
