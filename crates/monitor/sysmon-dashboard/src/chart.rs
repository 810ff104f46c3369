//! Chart surface availability
//!
//! The charting backend may not be ready when the dashboard starts. It is
//! checked with a bounded retry and ends either `Ready` or `Unavailable`; the
//! rest of the dashboard keeps running in both cases. A later chart update
//! may still bring an `Unavailable` surface up.

use crate::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info};

/// Something that can host the dashboard charts
pub trait ChartProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the charting backend is loaded and a surface can be created
    fn is_loaded(&self) -> bool;
}

/// Built-in text charts. Always available.
#[derive(Debug, Default, Clone)]
pub struct TextCharts;

impl ChartProvider for TextCharts {
    fn name(&self) -> &str {
        "text"
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

/// Provider whose availability is flipped from outside, e.g. by a loader task
#[derive(Debug, Default, Clone)]
pub struct DeferredCharts {
    loaded: Arc<AtomicBool>,
}

impl DeferredCharts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }
}

impl ChartProvider for DeferredCharts {
    fn name(&self) -> &str {
        "deferred"
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

/// Lifecycle of the chart surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartState {
    /// Not initialized yet
    Pending,
    /// Surfaces exist and accept updates
    Ready,
    /// Gave up waiting for the backend
    Unavailable,
}

/// Single initialization attempt
pub fn try_initialize(provider: &dyn ChartProvider) -> Result<()> {
    if provider.is_loaded() {
        debug!("Chart backend '{}' ready", provider.name());
        Ok(())
    } else {
        Err(DashboardError::ChartUnavailable(format!(
            "chart backend '{}' not loaded",
            provider.name()
        )))
    }
}

/// Poll the provider every `poll_interval` until it is loaded or
/// `load_timeout` elapses.
pub async fn initialize_with_retry(
    provider: &dyn ChartProvider,
    poll_interval: Duration,
    load_timeout: Duration,
) -> ChartState {
    if try_initialize(provider).is_ok() {
        return ChartState::Ready;
    }

    info!(
        "Chart backend '{}' not loaded, waiting up to {:?}",
        provider.name(),
        load_timeout
    );

    let wait = async {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if provider.is_loaded() {
                return;
            }
        }
    };

    match timeout(load_timeout, wait).await {
        Ok(()) => {
            info!("Chart backend '{}' loaded", provider.name());
            ChartState::Ready
        }
        Err(_) => {
            error!(
                "Chart backend '{}' load timed out, continuing without charts",
                provider.name()
            );
            ChartState::Unavailable
        }
    }
}
