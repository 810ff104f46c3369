//! Request/response client for the monitoring REST API

use crate::model::{Alert, AlertSummary, HealthReport, MetricSample, Task, TaskSummary};
use crate::Result;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const RECENT_METRICS_PATH: &str = "/api/metrics/recent";
const HEALTH_PATH: &str = "/api/metrics/health";
const TASKS_PATH: &str = "/api/tasks";
const TASK_SUMMARY_PATH: &str = "/api/tasks/summary";
const UNRESOLVED_ALERTS_PATH: &str = "/api/alerts/unresolved";
const ALERT_SUMMARY_PATH: &str = "/api/alerts/summary";

/// GET endpoints, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RecentMetrics,
    Health,
    Tasks,
    TaskSummary,
    UnresolvedAlerts,
    AlertSummary,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::RecentMetrics => RECENT_METRICS_PATH,
            Self::Health => HEALTH_PATH,
            Self::Tasks => TASKS_PATH,
            Self::TaskSummary => TASK_SUMMARY_PATH,
            Self::UnresolvedAlerts => UNRESOLVED_ALERTS_PATH,
            Self::AlertSummary => ALERT_SUMMARY_PATH,
        }
    }

    /// What failed to load, for user notices
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RecentMetrics => "system metrics",
            Self::Health => "system health",
            Self::Tasks => "tasks",
            Self::TaskSummary => "task summary",
            Self::UnresolvedAlerts => "alerts",
            Self::AlertSummary => "alert summary",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Synthetic data the backend can be asked to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerateKind {
    Metric,
    Task,
    Alert,
}

impl GenerateKind {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Metric => "/api/metrics/generate",
            Self::Task => "/api/tasks/generate",
            Self::Alert => "/api/alerts/generate",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Task => "task",
            Self::Alert => "alert",
        }
    }
}

/// Thin typed wrapper over the REST endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let url = self.url(endpoint.path());
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Samples recorded in the last `minutes` minutes
    pub async fn recent_metrics(&self, minutes: u32) -> Result<Vec<MetricSample>> {
        let url = self.url(RECENT_METRICS_PATH);
        debug!("GET {}?minutes={}", url, minutes);
        let response = self
            .client
            .get(&url)
            .query(&[("minutes", minutes)])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.get_json(Endpoint::Health).await
    }

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.get_json(Endpoint::Tasks).await
    }

    pub async fn task_summary(&self) -> Result<TaskSummary> {
        self.get_json(Endpoint::TaskSummary).await
    }

    pub async fn unresolved_alerts(&self) -> Result<Vec<Alert>> {
        self.get_json(Endpoint::UnresolvedAlerts).await
    }

    pub async fn alert_summary(&self) -> Result<AlertSummary> {
        self.get_json(Endpoint::AlertSummary).await
    }

    /// Ask the backend to create one synthetic entity. The response body is
    /// informational only.
    pub async fn generate(&self, kind: GenerateKind) -> Result<serde_json::Value> {
        let url = self.url(kind.path());
        debug!("POST {}", url);
        let response = self.client.post(&url).send().await?.error_for_status()?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
