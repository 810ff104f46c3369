//! Transport adapters
//!
//! Request/response polling over HTTP and STOMP publish/subscribe over a
//! WebSocket. Neither channel retries; failures are reported to the caller.

mod http;
mod push;
pub mod stomp;

pub use http::{ApiClient, GenerateKind, Endpoint};
pub use push::{PushClient, PushEvent};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path of the STOMP WebSocket endpoint
pub const PUSH_PATH: &str = "/ws/websocket";

/// Push topics published by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Metrics,
    Health,
    Tasks,
    TaskSummary,
    Alerts,
    AlertSummary,
    NewMetric,
    NewTask,
    NewAlert,
}

impl Topic {
    pub const ALL: [Topic; 9] = [
        Topic::Metrics,
        Topic::Health,
        Topic::Tasks,
        Topic::TaskSummary,
        Topic::Alerts,
        Topic::AlertSummary,
        Topic::NewMetric,
        Topic::NewTask,
        Topic::NewAlert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Health => "health",
            Self::Tasks => "tasks",
            Self::TaskSummary => "task-summary",
            Self::Alerts => "alerts",
            Self::AlertSummary => "alert-summary",
            Self::NewMetric => "new-metric",
            Self::NewTask => "new-task",
            Self::NewAlert => "new-alert",
        }
    }

    /// STOMP destination, e.g. `/topic/task-summary`
    pub fn destination(&self) -> String {
        format!("/topic/{}", self.as_str())
    }

    pub fn from_destination(destination: &str) -> Option<Self> {
        let name = destination.strip_prefix("/topic/")?;
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
