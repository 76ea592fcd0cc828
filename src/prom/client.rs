//! Minimal client for the Prometheus instant-query HTTP API

use crate::{BoardError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Evaluates a query at a point in time
#[async_trait]
pub trait QueryApi: Send + Sync {
    async fn query(&self, query: &str, time: SystemTime) -> Result<QueryResponse>;
}

/// Successful query evaluation, with any warnings the server attached
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub data: QueryData,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryData {
    Vector(Vec<VectorSample>),
    Scalar(SampleValue),
    Matrix(serde_json::Value),
    String(serde_json::Value),
}

impl QueryData {
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryData::Vector(_) => "vector",
            QueryData::Scalar(_) => "scalar",
            QueryData::Matrix(_) => "matrix",
            QueryData::String(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorSample {
    pub metric: BTreeMap<String, String>,
    pub value: SampleValue,
}

/// `[<unix seconds>, "<value>"]` as sent on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct SampleValue(pub f64, pub String);

impl SampleValue {
    pub fn parse(&self) -> Result<f64> {
        self.1
            .parse::<f64>()
            .map_err(|_| BoardError::InvalidSampleValue(self.1.clone()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiStatus {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: ApiStatus,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl ApiResponse {
    fn into_result(self, query: &str) -> Result<QueryResponse> {
        match (self.status, self.data) {
            (ApiStatus::Success, Some(data)) => Ok(QueryResponse {
                data,
                warnings: self.warnings,
            }),
            (ApiStatus::Success, None) => Err(BoardError::QueryFailed {
                query: query.to_string(),
                reason: "response carried no data".to_string(),
            }),
            (ApiStatus::Error, _) => Err(BoardError::QueryFailed {
                query: query.to_string(),
                reason: format!(
                    "{}: {}",
                    self.error_type.as_deref().unwrap_or("unknown"),
                    self.error.as_deref().unwrap_or("no error message")
                ),
            }),
        }
    }
}

pub struct PrometheusClient {
    endpoint: reqwest::Url,
    http: reqwest::Client,
}

impl PrometheusClient {
    pub fn new(address: &str) -> Result<Self> {
        let base = reqwest::Url::parse(address).map_err(|e| {
            BoardError::ConfigError(format!("Invalid Prometheus address {}: {}", address, e))
        })?;
        let endpoint = base
            .join(&format!("{}/api/v1/query", base.path().trim_end_matches('/')))
            .map_err(|e| {
                BoardError::ConfigError(format!("Invalid Prometheus address {}: {}", address, e))
            })?;

        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryApi for PrometheusClient {
    async fn query(&self, query: &str, time: SystemTime) -> Result<QueryResponse> {
        let ts = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        debug!("Querying {} at {}: {}", self.endpoint, ts, query);

        // Prometheus reports query errors as JSON bodies on 4xx/5xx, so the
        // status code is not checked before decoding.
        let response: ApiResponse = self
            .http
            .get(self.endpoint.clone())
            .query(&[("query", query), ("time", &ts.to_string())])
            .send()
            .await?
            .json()
            .await?;

        response.into_result(query)
    }
}
