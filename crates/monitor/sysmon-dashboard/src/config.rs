//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings. Endpoint paths and topic names are fixed; only the
/// backend location and timings vary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// Window for the initial and dimension-change metric fetches
    pub initial_window_minutes: u32,
    /// Whether the synthetic data generator runs
    pub enable_generator: bool,
    pub generation_interval: Duration,
    pub notice_ttl: Duration,
    pub chart_poll_interval: Duration,
    pub chart_load_timeout: Duration,
    /// Delay before a chart update is retried after re-initialization
    pub chart_retry_delay: Duration,
    pub connect_timeout: Duration,
    /// How often the front-end is handed a frame
    pub render_interval: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            initial_window_minutes: 5,
            enable_generator: true,
            generation_interval: Duration::from_secs(3),
            notice_ttl: Duration::from_secs(3),
            chart_poll_interval: Duration::from_millis(500),
            chart_load_timeout: Duration::from_secs(10),
            chart_retry_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(10),
            render_interval: Duration::from_secs(2),
        }
    }
}

impl DashboardConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_generator(mut self, enabled: bool) -> Self {
        self.enable_generator = enabled;
        self
    }

    /// STOMP endpoint derived from the base URL (SockJS raw WebSocket path)
    pub fn push_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", ws_base, crate::transport::PUSH_PATH)
    }
}
