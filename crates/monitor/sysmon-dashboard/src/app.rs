//! Event loop wiring the dashboard to its data sources
//!
//! A single task owns the [`Dashboard`]. Push events, user commands, the
//! generator tick, the render tick and completed requests are all
//! serialized through one `select!`, so no two updates interleave.

use crate::chart::{self, ChartProvider, TextCharts};
use crate::config::DashboardConfig;
use crate::dashboard::{ChartUpdate, Dashboard, Effect};
use crate::generator::SyntheticGenerator;
use crate::model::{Alert, AlertSummary, HealthReport, MetricSample, Task, TaskSummary};
use crate::transport::{ApiClient, Endpoint, GenerateKind, PushClient, PushEvent};
use crate::view::{NoticeLevel, RenderSink};
use crate::{Dimension, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use metrics::counter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Request/response side of the backend
#[async_trait]
pub trait MonitorSource: Send + Sync {
    async fn recent_metrics(&self, minutes: u32) -> Result<Vec<MetricSample>>;
    async fn health(&self) -> Result<HealthReport>;
    async fn tasks(&self) -> Result<Vec<Task>>;
    async fn task_summary(&self) -> Result<TaskSummary>;
    async fn unresolved_alerts(&self) -> Result<Vec<Alert>>;
    async fn alert_summary(&self) -> Result<AlertSummary>;
    async fn generate(&self, kind: GenerateKind) -> Result<serde_json::Value>;
}

#[async_trait]
impl MonitorSource for ApiClient {
    async fn recent_metrics(&self, minutes: u32) -> Result<Vec<MetricSample>> {
        ApiClient::recent_metrics(self, minutes).await
    }

    async fn health(&self) -> Result<HealthReport> {
        ApiClient::health(self).await
    }

    async fn tasks(&self) -> Result<Vec<Task>> {
        ApiClient::tasks(self).await
    }

    async fn task_summary(&self) -> Result<TaskSummary> {
        ApiClient::task_summary(self).await
    }

    async fn unresolved_alerts(&self) -> Result<Vec<Alert>> {
        ApiClient::unresolved_alerts(self).await
    }

    async fn alert_summary(&self) -> Result<AlertSummary> {
        ApiClient::alert_summary(self).await
    }

    async fn generate(&self, kind: GenerateKind) -> Result<serde_json::Value> {
        ApiClient::generate(self, kind).await
    }
}

/// User actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleStream,
    TogglePlayback,
    Refresh,
    SetDimension(Dimension),
    SetTimeRange(u32),
    Search(String),
    ToggleTheme,
    ShowTask(i64),
    Quit,
}

impl FromStr for Command {
    type Err = String;

    /// Parse one line of terminal input, e.g. `dim region` or `search api`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (word, arg) = match s.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (s, ""),
        };

        match word.to_lowercase().as_str() {
            "p" | "pause" | "stream" => Ok(Self::ToggleStream),
            "h" | "history" => Ok(Self::TogglePlayback),
            "r" | "refresh" => Ok(Self::Refresh),
            "t" | "theme" => Ok(Self::ToggleTheme),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "dim" | "dimension" => arg.parse().map(Self::SetDimension),
            "range" => arg
                .parse()
                .map(Self::SetTimeRange)
                .map_err(|_| format!("invalid time range '{}', expected minutes", arg)),
            "task" => arg
                .parse()
                .map(Self::ShowTask)
                .map_err(|_| format!("invalid task id '{}'", arg)),
            "search" | "/" => Ok(Self::Search(arg.to_string())),
            _ if word.starts_with('/') => Ok(Self::Search(s[1..].trim().to_string())),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Finished request or delay, applied on the loop task
enum Completion {
    Metrics(Result<Vec<MetricSample>>),
    Distribution {
        result: Result<Vec<MetricSample>>,
        from_push: bool,
    },
    Health(Result<HealthReport>),
    Tasks(Result<Vec<Task>>),
    TaskSummary(Result<TaskSummary>),
    Alerts(Result<Vec<Alert>>),
    AlertSummary(Result<AlertSummary>),
    Generated {
        kind: GenerateKind,
        result: Result<serde_json::Value>,
    },
    ChartRetry(ChartUpdate),
}

type Pending = FuturesUnordered<BoxFuture<'static, Completion>>;

pub struct DashboardApp {
    config: DashboardConfig,
    source: Arc<dyn MonitorSource>,
    push: Option<PushClient>,
    charts: Arc<dyn ChartProvider>,
    generator: SyntheticGenerator,
    rng: StdRng,
}

impl DashboardApp {
    /// App talking to the backend at `config.base_url`
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let source = Arc::new(ApiClient::new(config.base_url.clone())?);
        let push = PushClient::new(config.push_url()).with_connect_timeout(config.connect_timeout);
        Ok(Self {
            config,
            source,
            push: Some(push),
            charts: Arc::new(TextCharts),
            generator: SyntheticGenerator::default(),
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_source(mut self, source: Arc<dyn MonitorSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the push client; `None` runs fetch-only
    pub fn with_push(mut self, push: Option<PushClient>) -> Self {
        self.push = push;
        self
    }

    pub fn with_charts(mut self, charts: Arc<dyn ChartProvider>) -> Self {
        self.charts = charts;
        self
    }

    pub fn with_generator(mut self, generator: SyntheticGenerator, seed: u64) -> Self {
        self.generator = generator;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub async fn run(self, commands: mpsc::Receiver<Command>) -> Result<Dashboard> {
        self.run_with(commands, |_| {}).await
    }

    /// Run until `Quit` or until the command channel closes. `on_frame` is
    /// called on every render tick.
    pub async fn run_with<F>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut on_frame: F,
    ) -> Result<Dashboard>
    where
        F: FnMut(&Dashboard),
    {
        let mut dashboard = Dashboard::new(&self.config, self.charts.clone());

        let state = chart::initialize_with_retry(
            self.charts.as_ref(),
            self.config.chart_poll_interval,
            self.config.chart_load_timeout,
        )
        .await;
        dashboard.set_chart_state(state);

        let mut pending: Pending = FuturesUnordered::new();
        self.schedule(
            &mut pending,
            Effect::LoadAll {
                minutes: dashboard.window_minutes(),
            },
        );

        let (push_tx, push_rx) = mpsc::channel(256);
        let mut push_rx = Some(push_rx);
        let mut reader = None;
        match &self.push {
            Some(push) => match push.connect(push_tx).await {
                Ok(handle) => {
                    reader = Some(handle);
                    dashboard.push_connected();
                }
                Err(e) => {
                    push_rx = None;
                    dashboard.push_unavailable(&e.to_string());
                }
            },
            None => {
                push_rx = None;
                info!("Push disabled, running fetch-only");
            }
        }

        let mut generation = self.config.enable_generator.then(|| {
            let mut ticker = interval(self.config.generation_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        let mut render = interval(self.config.render_interval);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Dashboard running against {}", self.config.base_url);

        loop {
            tokio::select! {
                event = next_push(&mut push_rx) => match event {
                    Some(PushEvent::Message { topic, body }) => {
                        if let Err(e) = dashboard.handle_push(topic, &body) {
                            warn!("Dropping malformed {} payload: {}", topic, e);
                        }
                    }
                    Some(PushEvent::Closed { reason }) => {
                        push_rx = None;
                        dashboard.push_unavailable(&reason);
                    }
                    None => {
                        push_rx = None;
                        dashboard.push_unavailable("push reader stopped");
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => {
                        info!("Dashboard stopping");
                        break;
                    }
                    Some(command) => self.execute(&mut dashboard, command),
                },
                _ = next_tick(&mut generation) => {
                    let kinds = self.generator.plan(&mut self.rng, dashboard.feed().is_streaming());
                    for kind in kinds {
                        counter!("dashboard_generate_requests_total", "kind" => kind.as_str()).increment(1);
                        let source = self.source.clone();
                        pending.push(
                            async move {
                                Completion::Generated {
                                    kind,
                                    result: source.generate(kind).await,
                                }
                            }
                            .boxed(),
                        );
                    }
                }
                _ = render.tick() => {
                    dashboard.view_mut().notices.expire(Instant::now());
                    on_frame(&dashboard);
                }
                Some(done) = pending.next(), if !pending.is_empty() => {
                    complete(&mut dashboard, done);
                }
            }

            for effect in dashboard.take_effects() {
                self.schedule(&mut pending, effect);
            }
        }

        if let Some(reader) = reader {
            reader.abort();
        }
        Ok(dashboard)
    }

    fn execute(&self, dashboard: &mut Dashboard, command: Command) {
        debug!("Command {:?}", command);
        match command {
            Command::ToggleStream => {
                dashboard.toggle_streaming();
            }
            Command::TogglePlayback => {
                dashboard.toggle_playback();
            }
            Command::Refresh => dashboard.refresh(),
            Command::SetDimension(dimension) => dashboard.set_dimension(dimension),
            Command::SetTimeRange(minutes) => dashboard.set_time_range(minutes),
            Command::Search(term) => dashboard.search(&term),
            Command::ToggleTheme => dashboard.toggle_theme(),
            Command::ShowTask(id) => match dashboard.task_detail(id) {
                Some(detail) => {
                    let message = format!(
                        "Task {}: {} on {}, {} (created {}, updated {})",
                        detail.name,
                        detail.status,
                        detail.cluster,
                        detail.progress,
                        detail.created,
                        detail.updated
                    );
                    dashboard.view_mut().notify(NoticeLevel::Info, &message);
                }
                None => dashboard
                    .view_mut()
                    .notify(NoticeLevel::Warning, &format!("Task {} is not listed", id)),
            },
            Command::Quit => {}
        }
    }

    fn schedule(&self, pending: &mut Pending, effect: Effect) {
        let source = self.source.clone();
        match effect {
            Effect::LoadAll { minutes } => {
                self.schedule(pending, Effect::LoadMetrics { minutes });
                let s = source.clone();
                pending.push(async move { Completion::Health(s.health().await) }.boxed());
                let s = source.clone();
                pending.push(async move { Completion::Tasks(s.tasks().await) }.boxed());
                let s = source.clone();
                pending.push(async move { Completion::TaskSummary(s.task_summary().await) }.boxed());
                let s = source.clone();
                pending.push(async move { Completion::Alerts(s.unresolved_alerts().await) }.boxed());
                pending.push(async move { Completion::AlertSummary(source.alert_summary().await) }.boxed());
            }
            Effect::LoadMetrics { minutes } => {
                pending.push(
                    async move { Completion::Metrics(source.recent_metrics(minutes).await) }.boxed(),
                );
            }
            Effect::RefreshDistribution { minutes, from_push } => {
                pending.push(
                    async move {
                        Completion::Distribution {
                            result: source.recent_metrics(minutes).await,
                            from_push,
                        }
                    }
                    .boxed(),
                );
            }
            Effect::RetryChart(update) => {
                let delay = self.config.chart_retry_delay;
                pending.push(
                    async move {
                        tokio::time::sleep(delay).await;
                        Completion::ChartRetry(update)
                    }
                    .boxed(),
                );
            }
        }
    }
}

fn complete(dashboard: &mut Dashboard, done: Completion) {
    match done {
        Completion::Metrics(Ok(samples)) => dashboard.apply_metrics(samples),
        Completion::Metrics(Err(e)) => dashboard.fetch_failed(Endpoint::RecentMetrics, &e),
        Completion::Distribution { result: Ok(samples), from_push } => {
            dashboard.refresh_distribution(samples, from_push)
        }
        Completion::Distribution { result: Err(e), from_push: true } => {
            warn!("Distribution refresh after live metric failed: {}", e);
        }
        Completion::Distribution { result: Err(e), from_push: false } => {
            dashboard.fetch_failed(Endpoint::RecentMetrics, &e)
        }
        Completion::Health(Ok(report)) => dashboard.apply_health(&report),
        Completion::Health(Err(e)) => dashboard.fetch_failed(Endpoint::Health, &e),
        Completion::Tasks(Ok(tasks)) => dashboard.apply_tasks(&tasks),
        Completion::Tasks(Err(e)) => dashboard.fetch_failed(Endpoint::Tasks, &e),
        Completion::TaskSummary(Ok(summary)) => dashboard.apply_task_summary(summary),
        Completion::TaskSummary(Err(e)) => dashboard.fetch_failed(Endpoint::TaskSummary, &e),
        Completion::Alerts(Ok(alerts)) => dashboard.apply_alerts(&alerts),
        Completion::Alerts(Err(e)) => dashboard.fetch_failed(Endpoint::UnresolvedAlerts, &e),
        Completion::AlertSummary(Ok(summary)) => dashboard.apply_alert_summary(summary),
        Completion::AlertSummary(Err(e)) => dashboard.fetch_failed(Endpoint::AlertSummary, &e),
        Completion::Generated { kind, result: Ok(_) } => {
            debug!("Generated synthetic {}", kind.as_str());
        }
        Completion::Generated { kind, result: Err(e) } => dashboard.generate_failed(kind, &e),
        Completion::ChartRetry(update) => dashboard.retry_chart(update),
    }
}

async fn next_push(rx: &mut Option<mpsc::Receiver<PushEvent>>) -> Option<PushEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
