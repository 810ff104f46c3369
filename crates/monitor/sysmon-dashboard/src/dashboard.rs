//! Dashboard controller
//!
//! Owns the feed mode, the view-model and the handler table. All mutation
//! goes through here. I/O the dashboard needs (fetches, delayed retries) is
//! queued as [`Effect`]s for the event loop to carry out.

use crate::aggregator::{self, Dimension, MetricSummary};
use crate::chart::{self, ChartProvider, ChartState};
use crate::config::DashboardConfig;
use crate::dispatch::Dispatcher;
use crate::feed::{FeedController, Playback, Streaming};
use crate::format;
use crate::model::{Alert, AlertSummary, HealthReport, MetricSample, Task, TaskSummary};
use crate::transport::{Endpoint, GenerateKind, Topic};
use crate::view::{DashboardView, NoticeLevel, RenderSink, TaskDetail};
use crate::{DashboardError, Result};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A chart redraw that may have to wait for the chart surface
#[derive(Debug, Clone, PartialEq)]
pub enum ChartUpdate {
    /// Time series and distribution from a full metric set
    Full(Vec<MetricSample>),
    /// One live point appended to the time series
    Point(MetricSample),
    /// Distribution chart only
    Distribution(Vec<MetricSample>),
}

/// Work the event loop performs on the dashboard's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run every initial GET again
    LoadAll { minutes: u32 },
    /// Fetch recent metrics and redraw gauges, table and charts
    LoadMetrics { minutes: u32 },
    /// Fetch recent metrics and redraw the distribution chart only.
    /// `from_push` results are dropped if the feed stopped accepting.
    RefreshDistribution { minutes: u32, from_push: bool },
    /// Retry a chart update after a short delay
    RetryChart(ChartUpdate),
}

/// Whether a pushed event reached the views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Applied,
    Dropped,
}

pub struct Dashboard {
    feed: FeedController,
    view: DashboardView,
    dimension: Dimension,
    window_minutes: u32,
    charts: Arc<dyn ChartProvider>,
    dispatcher: Dispatcher,
    effects: Vec<Effect>,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, charts: Arc<dyn ChartProvider>) -> Self {
        Self {
            feed: FeedController::new(),
            view: DashboardView::new(config.notice_ttl),
            dimension: Dimension::default(),
            window_minutes: config.initial_window_minutes,
            charts,
            dispatcher: Dispatcher::standard(),
            effects: Vec::new(),
        }
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut DashboardView {
        &mut self.view
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    pub fn chart_provider(&self) -> Arc<dyn ChartProvider> {
        self.charts.clone()
    }

    pub fn set_chart_state(&mut self, state: ChartState) {
        self.view.set_chart_state(state);
    }

    /// Drain queued effects in the order they were raised
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Route one pushed payload. Acceptance is checked now, at arrival.
    pub fn handle_push(&mut self, topic: Topic, body: &str) -> Result<PushOutcome> {
        if !self.feed.accepts() {
            debug!("Dropping {} event, feed mode {:?}", topic, self.feed.mode());
            counter!("dashboard_push_events_total", "topic" => topic.as_str(), "outcome" => "dropped")
                .increment(1);
            return Ok(PushOutcome::Dropped);
        }

        let handler = self.dispatcher.handler(topic).ok_or_else(|| {
            DashboardError::Protocol(format!("no handler registered for topic {}", topic))
        })?;
        handler(self, body)?;

        counter!("dashboard_push_events_total", "topic" => topic.as_str(), "outcome" => "applied")
            .increment(1);
        Ok(PushOutcome::Applied)
    }

    /// Gauges, table and charts from a full metric set. Empty sets are ignored.
    pub fn apply_metrics(&mut self, samples: Vec<MetricSample>) {
        let Some(summary) = MetricSummary::from_samples(&samples) else {
            debug!("No metric samples, skipping display update");
            return;
        };

        self.view.render_gauges(&summary);
        self.view.render_metrics_table(&samples);
        self.draw_charts(ChartUpdate::Full(samples), false);
    }

    pub fn apply_health(&mut self, report: &HealthReport) {
        self.view.render_health(report);
    }

    pub fn apply_tasks(&mut self, tasks: &[Task]) {
        self.view.render_tasks(tasks);
    }

    pub fn apply_task_summary(&mut self, summary: TaskSummary) {
        self.view.render_task_summary(summary);
    }

    pub fn apply_alerts(&mut self, alerts: &[Alert]) {
        self.view.render_alerts(alerts);
    }

    pub fn apply_alert_summary(&mut self, summary: AlertSummary) {
        self.view.render_alert_summary(summary);
    }

    /// Append one live sample to the time series, then ask for a fresh
    /// distribution.
    pub fn add_new_metric(&mut self, sample: MetricSample) {
        self.draw_charts(ChartUpdate::Point(sample), false);
    }

    pub fn add_new_task(&mut self, task: Task) {
        self.view.prepend_task(task);
    }

    pub fn add_new_alert(&mut self, alert: Alert) {
        self.view.prepend_alert(alert);
    }

    /// Distribution-only redraw from a fetched metric set
    pub fn refresh_distribution(&mut self, samples: Vec<MetricSample>, from_push: bool) {
        if from_push && !self.feed.accepts() {
            debug!("Feed stopped accepting, dropping distribution refresh");
            return;
        }
        if samples.is_empty() {
            debug!("No metric samples for distribution");
            return;
        }
        self.draw_charts(ChartUpdate::Distribution(samples), false);
    }

    /// Second and last attempt at a deferred chart update
    pub fn retry_chart(&mut self, update: ChartUpdate) {
        self.draw_charts(update, true);
    }

    fn draw_charts(&mut self, update: ChartUpdate, retried: bool) {
        match self.view.chart_state() {
            ChartState::Ready => {
                if let Err(e) = self.render_chart_update(update) {
                    warn!("Chart update failed: {}", e);
                }
            }
            _ if retried => {
                warn!("Chart surface still not initialized, dropping update");
            }
            ChartState::Pending | ChartState::Unavailable => {
                match chart::try_initialize(self.charts.as_ref()) {
                    Ok(()) => {
                        info!("Chart surface re-initialized, retrying update");
                        self.view.set_chart_state(ChartState::Ready);
                        self.effects.push(Effect::RetryChart(update));
                    }
                    Err(e) => {
                        warn!("Chart re-initialization failed, dropping update: {}", e);
                    }
                }
            }
        }
    }

    fn render_chart_update(&mut self, update: ChartUpdate) -> Result<()> {
        match update {
            ChartUpdate::Full(samples) => {
                self.view
                    .render_time_series(aggregator::project_time_series(&samples))?;
                self.view.render_distribution(&aggregator::group_by_dimension(
                    &samples,
                    self.dimension,
                ))?;
            }
            ChartUpdate::Point(sample) => {
                self.view.append_time_series(
                    format::format_time(&sample.timestamp),
                    sample.cpu_usage,
                    sample.memory_usage,
                )?;
                self.effects.push(Effect::RefreshDistribution {
                    minutes: self.window_minutes,
                    from_push: true,
                });
            }
            ChartUpdate::Distribution(samples) => {
                self.view.render_distribution(&aggregator::group_by_dimension(
                    &samples,
                    self.dimension,
                ))?;
            }
        }
        Ok(())
    }

    pub fn toggle_streaming(&mut self) -> Streaming {
        self.feed.toggle_streaming()
    }

    /// Entering history playback starts the (unavailable) replay
    pub fn toggle_playback(&mut self) -> Playback {
        let playback = self.feed.toggle_playback();
        if playback == Playback::History {
            self.start_history_playback();
        }
        playback
    }

    fn start_history_playback(&mut self) {
        info!("History playback requested, replay is not available");
        self.view
            .notify(NoticeLevel::Info, "History playback is not available yet");
    }

    pub fn toggle_theme(&mut self) {
        self.view
            .notify(NoticeLevel::Info, "Theme switching is not available yet");
    }

    pub fn refresh(&mut self) {
        self.effects.push(Effect::LoadAll {
            minutes: self.window_minutes,
        });
        self.view.notify(NoticeLevel::Success, "Data refreshed");
    }

    pub fn set_dimension(&mut self, dimension: Dimension) {
        info!("Distribution dimension set to {}", dimension);
        self.dimension = dimension;
        self.effects.push(Effect::RefreshDistribution {
            minutes: self.window_minutes,
            from_push: false,
        });
    }

    pub fn set_time_range(&mut self, minutes: u32) {
        info!("Loading metrics for the last {} minutes", minutes);
        self.effects.push(Effect::LoadMetrics { minutes });
    }

    pub fn search(&mut self, term: &str) {
        self.view.apply_filter(term);
    }

    pub fn task_detail(&self, task_id: i64) -> Option<TaskDetail> {
        self.view.task_detail(task_id)
    }

    /// Record a failed GET: log it and show a transient notice
    pub fn fetch_failed(&mut self, endpoint: Endpoint, err: &DashboardError) {
        error!("Failed to load {} from {}: {}", endpoint.describe(), endpoint, err);
        counter!("dashboard_fetch_failures_total", "endpoint" => endpoint.path()).increment(1);
        self.view.notify(
            NoticeLevel::Error,
            &format!("Failed to load {}", endpoint.describe()),
        );
    }

    pub fn generate_failed(&mut self, kind: GenerateKind, err: &DashboardError) {
        error!("Failed to generate synthetic {}: {}", kind.as_str(), err);
    }

    /// The push channel is gone or never came up; fetches keep working
    pub fn push_unavailable(&mut self, reason: &str) {
        warn!("Live updates unavailable: {}", reason);
        self.view.notify(
            NoticeLevel::Warning,
            "Live updates unavailable, manual refresh still works",
        );
    }

    pub fn push_connected(&mut self) {
        self.view.notify(NoticeLevel::Success, "Live updates connected");
    }
}
