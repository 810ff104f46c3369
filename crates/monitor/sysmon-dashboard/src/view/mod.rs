//! Render sink and the dashboard view-model
//!
//! Lists and tables are redrawn in full on every update. The live chart is the
//! only surface that keeps prior content, in its bounded ring buffer.

mod charts;
mod notice;
mod text;

pub use charts::{DistributionChart, TimeSeriesChart, TIME_SERIES_CAPACITY};
pub use notice::{Notice, NoticeBoard, NoticeLevel};

use crate::aggregator::{DimensionGroup, MetricSummary, TimeSeries};
use crate::chart::ChartState;
use crate::feed::BoundedFeed;
use crate::format;
use crate::model::{Alert, AlertSummary, HealthReport, HealthState, MetricSample, Task, TaskSummary};
use crate::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tasks shown in the task list
pub const TASK_LIST_CAPACITY: usize = 10;
/// Alerts shown in the alert list
pub const ALERT_LIST_CAPACITY: usize = 5;
/// Rows shown in the metrics table
pub const METRICS_TABLE_ROWS: usize = 10;

/// Applies computed view-models to a display surface
pub trait RenderSink {
    fn render_gauges(&mut self, summary: &MetricSummary);

    fn render_metrics_table(&mut self, samples: &[MetricSample]);

    /// Full redraw of the time-series chart
    fn render_time_series(&mut self, series: TimeSeries) -> Result<()>;

    /// Incremental append to the time-series chart
    fn append_time_series(&mut self, label: String, cpu: f64, memory: f64) -> Result<()>;

    fn render_distribution(&mut self, groups: &[DimensionGroup]) -> Result<()>;

    fn render_health(&mut self, report: &HealthReport);

    fn render_tasks(&mut self, tasks: &[Task]);

    fn prepend_task(&mut self, task: Task);

    fn render_task_summary(&mut self, summary: TaskSummary);

    fn render_alerts(&mut self, alerts: &[Alert]);

    fn prepend_alert(&mut self, alert: Alert);

    fn render_alert_summary(&mut self, summary: AlertSummary);

    fn notify(&mut self, level: NoticeLevel, message: &str);
}

/// Text gauges and progress-bar widths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugePanel {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub load: String,
    pub network_in: String,
    pub network_out: String,
    pub cpu_bar: f64,
    pub memory_bar: f64,
    pub disk_bar: f64,
    pub load_bar: f64,
}

impl From<&MetricSummary> for GaugePanel {
    fn from(summary: &MetricSummary) -> Self {
        Self {
            cpu: format::percent(summary.avg_cpu),
            memory: format::percent(summary.avg_memory),
            disk: format::percent(summary.avg_disk),
            load: format::load(summary.avg_load),
            network_in: format::rate(summary.avg_network_in),
            network_out: format::rate(summary.avg_network_out),
            cpu_bar: summary.avg_cpu,
            memory_bar: summary.avg_memory,
            disk_bar: summary.avg_disk,
            load_bar: format::load_bar_width(summary.avg_load),
        }
    }
}

/// One formatted row of the metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub server: String,
    pub region: String,
    pub service: String,
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub network_in: String,
    pub network_out: String,
    pub load: String,
    pub time: String,
}

impl From<&MetricSample> for MetricRow {
    fn from(m: &MetricSample) -> Self {
        Self {
            server: m.server_name.clone(),
            region: m.region.clone(),
            service: m.service_type.clone(),
            cpu: format::percent(m.cpu_usage),
            memory: format::percent(m.memory_usage),
            disk: format::percent(m.disk_usage),
            network_in: format::rate(m.network_in),
            network_out: format::rate(m.network_out),
            load: format::load(m.load_average),
            time: format::format_time(&m.timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicator {
    pub state: HealthState,
    pub caption: String,
}

/// A task list entry and whether the search filter hides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub task: Task,
    pub visible: bool,
}

impl TaskRow {
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}%",
            self.task.task_name,
            self.task.target_cluster,
            format::status_text(self.task.status),
            self.task.progress
        )
        .to_lowercase()
    }
}

/// An alert list entry and whether the search filter hides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRow {
    pub alert: Alert,
    pub visible: bool,
}

impl AlertRow {
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.alert.source,
            self.alert.message,
            format::severity_text(self.alert.severity)
        )
        .to_lowercase()
    }
}

/// Formatted detail record for a single task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    pub name: String,
    pub cluster: String,
    pub status: String,
    pub progress: String,
    pub created: String,
    pub updated: String,
}

impl From<&Task> for TaskDetail {
    fn from(task: &Task) -> Self {
        Self {
            name: task.task_name.clone(),
            cluster: task.target_cluster.clone(),
            status: format::status_text(task.status).to_string(),
            progress: format!("{}%", task.progress),
            created: format::format_time(&task.created_time),
            updated: format::format_time(&task.updated_time),
        }
    }
}

/// In-memory display surface for the whole dashboard
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub gauges: Option<GaugePanel>,
    pub metrics_table: Vec<MetricRow>,
    pub time_series: TimeSeriesChart,
    pub distribution: DistributionChart,
    pub health: Option<HealthIndicator>,
    pub tasks: BoundedFeed<TaskRow>,
    pub task_summary: Option<TaskSummary>,
    pub alerts: BoundedFeed<AlertRow>,
    pub alert_summary: Option<AlertSummary>,
    pub notices: NoticeBoard,
    chart_state: ChartState,
    filter: String,
}

impl DashboardView {
    pub fn new(notice_ttl: Duration) -> Self {
        Self {
            gauges: None,
            metrics_table: Vec::new(),
            time_series: TimeSeriesChart::default(),
            distribution: DistributionChart::default(),
            health: None,
            tasks: BoundedFeed::new(TASK_LIST_CAPACITY),
            task_summary: None,
            alerts: BoundedFeed::new(ALERT_LIST_CAPACITY),
            alert_summary: None,
            notices: NoticeBoard::new(notice_ttl),
            chart_state: ChartState::Pending,
            filter: String::new(),
        }
    }

    pub fn chart_state(&self) -> ChartState {
        self.chart_state
    }

    pub fn set_chart_state(&mut self, state: ChartState) {
        self.chart_state = state;
    }

    /// Case-insensitive search over task and alert rows. An empty term shows
    /// everything.
    pub fn apply_filter(&mut self, term: &str) {
        self.filter = term.trim().to_lowercase();
        let filter = self.filter.as_str();

        let tasks: Vec<TaskRow> = self
            .tasks
            .iter()
            .cloned()
            .map(|mut row| {
                row.visible = matches_filter(filter, &row.search_text());
                row
            })
            .collect();
        let alerts: Vec<AlertRow> = self
            .alerts
            .iter()
            .cloned()
            .map(|mut row| {
                row.visible = matches_filter(filter, &row.search_text());
                row
            })
            .collect();

        self.tasks.replace(tasks);
        self.alerts.replace(alerts);
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn task_detail(&self, task_id: i64) -> Option<TaskDetail> {
        self.tasks
            .iter()
            .find(|row| row.task.id == task_id)
            .map(|row| TaskDetail::from(&row.task))
    }

    fn matches(&self, text: &str) -> bool {
        matches_filter(&self.filter, text)
    }

    fn ensure_charts(&self) -> Result<()> {
        match self.chart_state {
            ChartState::Ready => Ok(()),
            state => Err(DashboardError::ChartUnavailable(format!(
                "chart surface is {:?}",
                state
            ))),
        }
    }

    fn task_row(&self, task: Task) -> TaskRow {
        let mut row = TaskRow { task, visible: true };
        row.visible = self.matches(&row.search_text());
        row
    }

    fn alert_row(&self, alert: Alert) -> AlertRow {
        let mut row = AlertRow { alert, visible: true };
        row.visible = self.matches(&row.search_text());
        row
    }
}

fn matches_filter(filter: &str, text: &str) -> bool {
    filter.is_empty() || text.contains(filter)
}

impl RenderSink for DashboardView {
    fn render_gauges(&mut self, summary: &MetricSummary) {
        self.gauges = Some(GaugePanel::from(summary));
    }

    fn render_metrics_table(&mut self, samples: &[MetricSample]) {
        self.metrics_table = samples
            .iter()
            .take(METRICS_TABLE_ROWS)
            .map(MetricRow::from)
            .collect();
    }

    fn render_time_series(&mut self, series: TimeSeries) -> Result<()> {
        self.ensure_charts()?;
        self.time_series.replace(series);
        Ok(())
    }

    fn append_time_series(&mut self, label: String, cpu: f64, memory: f64) -> Result<()> {
        self.ensure_charts()?;
        self.time_series.push(label, cpu, memory);
        Ok(())
    }

    fn render_distribution(&mut self, groups: &[DimensionGroup]) -> Result<()> {
        self.ensure_charts()?;
        self.distribution.replace(groups);
        Ok(())
    }

    fn render_health(&mut self, report: &HealthReport) {
        let state = report.state();
        self.health = Some(HealthIndicator {
            state,
            caption: format::load_balance_text(state).to_string(),
        });
    }

    fn render_tasks(&mut self, tasks: &[Task]) {
        let rows: Vec<TaskRow> = tasks
            .iter()
            .take(TASK_LIST_CAPACITY)
            .map(|t| self.task_row(t.clone()))
            .collect();
        self.tasks.replace(rows);
    }

    fn prepend_task(&mut self, task: Task) {
        let row = self.task_row(task);
        self.tasks.push_front(row);
    }

    fn render_task_summary(&mut self, summary: TaskSummary) {
        self.task_summary = Some(summary);
    }

    fn render_alerts(&mut self, alerts: &[Alert]) {
        let rows: Vec<AlertRow> = alerts
            .iter()
            .take(ALERT_LIST_CAPACITY)
            .map(|a| self.alert_row(a.clone()))
            .collect();
        self.alerts.replace(rows);
    }

    fn prepend_alert(&mut self, alert: Alert) {
        let row = self.alert_row(alert);
        self.alerts.push_front(row);
    }

    fn render_alert_summary(&mut self, summary: AlertSummary) {
        self.alert_summary = Some(summary);
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertSeverity, TaskStatus};
    use chrono::NaiveDate;

    fn task(id: i64, name: &str) -> Task {
        let t = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        Task {
            id,
            task_name: name.to_string(),
            target_cluster: "cluster-a".to_string(),
            status: TaskStatus::Queued,
            progress: 0,
            created_time: t,
            updated_time: t,
        }
    }

    fn alert(source: &str) -> Alert {
        Alert {
            id: None,
            source: source.to_string(),
            message: "cpu high".to_string(),
            severity: AlertSeverity::High,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            resolved: false,
        }
    }

    fn view() -> DashboardView {
        DashboardView::new(Duration::from_secs(3))
    }

    #[test]
    fn test_chart_updates_rejected_until_ready() {
        let mut view = view();
        assert!(matches!(
            view.append_time_series("t".into(), 1.0, 2.0),
            Err(DashboardError::ChartUnavailable(_))
        ));

        view.set_chart_state(ChartState::Ready);
        view.append_time_series("t".into(), 1.0, 2.0).unwrap();
        assert_eq!(view.time_series.len(), 1);
    }

    #[test]
    fn test_task_list_cap_and_order() {
        let mut view = view();
        for i in 0..12 {
            view.prepend_task(task(i, &format!("task-{}", i)));
        }

        assert_eq!(view.tasks.len(), TASK_LIST_CAPACITY);
        assert_eq!(view.tasks.head().unwrap().task.id, 11);
        assert!(view.tasks.iter().all(|row| row.task.id >= 2));
    }

    #[test]
    fn test_alert_list_cap_and_order() {
        let mut view = view();
        for i in 0..7 {
            view.prepend_alert(alert(&format!("node-{}", i)));
        }

        assert_eq!(view.alerts.len(), ALERT_LIST_CAPACITY);
        assert_eq!(view.alerts.head().unwrap().alert.source, "node-6");
        assert_eq!(view.alerts.get(4).unwrap().alert.source, "node-2");
    }

    #[test]
    fn test_render_tasks_is_full_redraw() {
        let mut view = view();
        view.prepend_task(task(100, "stale"));
        view.render_tasks(&[task(1, "a"), task(2, "b")]);

        let ids: Vec<_> = view.tasks.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_filter_hides_non_matching_rows() {
        let mut view = view();
        view.render_tasks(&[task(1, "Deploy API"), task(2, "Rotate certs")]);
        view.render_alerts(&[alert("db-01"), alert("web-01")]);

        view.apply_filter("DEPLOY");
        let visible: Vec<_> = view.tasks.iter().filter(|r| r.visible).map(|r| r.task.id).collect();
        assert_eq!(visible, vec![1]);
        assert!(view.alerts.iter().all(|r| !r.visible));

        view.prepend_task(task(3, "deploy worker"));
        assert!(view.tasks.head().unwrap().visible);

        view.apply_filter("");
        assert!(view.tasks.iter().all(|r| r.visible));
    }

    #[test]
    fn test_gauges_from_summary() {
        let summary = MetricSummary {
            avg_cpu: 20.0,
            avg_memory: 55.55,
            avg_disk: 10.0,
            avg_load: 4.0,
            avg_network_in: 300.4,
            avg_network_out: 99.6,
            sample_count: 3,
        };

        let mut view = view();
        view.render_gauges(&summary);
        let gauges = view.gauges.unwrap();
        assert_eq!(gauges.cpu, "20.0%");
        assert_eq!(gauges.load, "4.00");
        assert_eq!(gauges.network_in, "300 MB/s");
        assert_eq!(gauges.network_out, "100 MB/s");
        assert_eq!(gauges.load_bar, 50.0);
    }

    #[test]
    fn test_task_detail_lookup() {
        let mut view = view();
        view.render_tasks(&[task(4, "Backup")]);

        let detail = view.task_detail(4).unwrap();
        assert_eq!(detail.status, "Queued");
        assert_eq!(detail.created, "2024-03-01 09:00:00");
        assert!(view.task_detail(5).is_none());
    }
}
