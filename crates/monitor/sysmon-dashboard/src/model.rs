//! Wire entities published by the monitoring backend
//!
//! All entities are read-only snapshots. Field names follow the backend's
//! camelCase JSON, timestamps are zone-less local date-times.

use crate::aggregator::classify_health;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One infrastructure metric sample for a single server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub server_name: String,
    pub region: String,
    pub service_type: String,
    /// CPU usage percentage (0-100)
    pub cpu_usage: f64,
    /// Memory usage percentage (0-100)
    pub memory_usage: f64,
    /// Disk usage percentage (0-100)
    pub disk_usage: f64,
    /// Inbound traffic in MB/s
    pub network_in: f64,
    /// Outbound traffic in MB/s
    pub network_out: f64,
    pub load_average: f64,
    pub timestamp: NaiveDateTime,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Running,
    Failed,
    Completed,
}

/// A deployment task owned by the external task system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub task_name: String,
    pub target_cluster: String,
    pub status: TaskStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub created_time: NaiveDateTime,
    pub updated_time: NaiveDateTime,
}

/// Alert severity levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// An infrastructure alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub resolved: bool,
}

/// Tri-state health indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthState {
    /// Map a backend status string onto the indicator.
    ///
    /// The backend reports `健康` / `警告` / `不健康` (and `未知` when it has no
    /// recent samples); English names are accepted as well.
    pub fn parse_status(status: &str) -> Option<Self> {
        match status.trim() {
            "健康" => Some(Self::Healthy),
            "警告" => Some(Self::Warning),
            "不健康" => Some(Self::Unhealthy),
            s if s.eq_ignore_ascii_case("healthy") => Some(Self::Healthy),
            s if s.eq_ignore_ascii_case("warning") => Some(Self::Warning),
            s if s.eq_ignore_ascii_case("unhealthy") => Some(Self::Unhealthy),
            _ => None,
        }
    }

    /// Like [`parse_status`](Self::parse_status), showing anything
    /// unrecognised as unhealthy.
    pub fn from_status(status: &str) -> Self {
        Self::parse_status(status).unwrap_or(Self::Unhealthy)
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Health-check payload from `/api/metrics/health` and `/topic/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub avg_cpu: f64,
    #[serde(default)]
    pub avg_memory: f64,
    #[serde(default)]
    pub avg_load: f64,
    #[serde(default)]
    pub server_count: u32,
}

impl HealthReport {
    /// An unrecognised status with sampled servers is classified from the
    /// reported averages instead.
    pub fn state(&self) -> HealthState {
        match HealthState::parse_status(&self.status) {
            Some(state) => state,
            None if self.server_count > 0 => {
                classify_health(self.avg_cpu, self.avg_memory, self.avg_load)
            }
            None => HealthState::Unhealthy,
        }
    }
}

/// Task counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub queued_count: u64,
    pub running_count: u64,
    pub failed_count: u64,
    pub completed_count: u64,
}

/// Unresolved alert counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    #[serde(default)]
    pub unresolved_count: u64,
    #[serde(default)]
    pub low_count: u64,
    #[serde(default)]
    pub medium_count: u64,
    #[serde(default)]
    pub high_count: u64,
    #[serde(default)]
    pub critical_count: u64,
}
