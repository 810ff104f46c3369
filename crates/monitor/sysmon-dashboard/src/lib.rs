//! # Sysmon Dashboard
//!
//! Headless controller for a live infrastructure dashboard. Metric samples,
//! tasks and alerts arrive either from request/response polling or from a
//! STOMP publish/subscribe feed, pass through the feed controller, get
//! aggregated, and land in an in-memory view-model that a front-end renders.
//!
//! ## Key Features
//! - Metric averages, per-dimension CPU distribution and time-series projection
//! - Live/paused and live/history feed modes evaluated per inbound event
//! - Bounded task (10) and alert (5) lists, 20-point live chart buffer
//! - Bounded-retry chart initialization with an explicit unavailable state
//! - Fetch-only degradation when the push connection cannot be established

pub mod aggregator;
pub mod app;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod feed;
pub mod format;
pub mod generator;
pub mod model;
pub mod transport;
pub mod view;

// Re-export main types
pub use aggregator::{Dimension, DimensionGroup, MetricSummary, TimeSeries};
pub use app::{Command, DashboardApp, MonitorSource};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, PushOutcome};
pub use feed::{BoundedFeed, FeedController, FeedMode};
pub use model::{Alert, AlertSeverity, AlertSummary, HealthReport, HealthState, MetricSample, Task, TaskStatus, TaskSummary};
pub use transport::{ApiClient, GenerateKind, PushClient, PushEvent, Topic};
pub use view::{DashboardView, RenderSink};

use thiserror::Error;

/// Dashboard error types
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Chart unavailable: {0}")]
    ChartUnavailable(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
