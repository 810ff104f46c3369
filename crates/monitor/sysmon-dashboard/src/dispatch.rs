//! Topic handler registration
//!
//! Each push topic maps to exactly one handler. Handlers decode the payload
//! before touching the dashboard, so a malformed payload changes nothing.

use crate::dashboard::Dashboard;
use crate::model::{Alert, AlertSummary, HealthReport, MetricSample, Task, TaskSummary};
use crate::transport::Topic;
use crate::Result;
use std::collections::HashMap;
use std::fmt;

/// Applies one decoded payload to the dashboard
pub type Handler = fn(&mut Dashboard, &str) -> Result<()>;

#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<Topic, Handler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("topics", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for every backend topic
    pub fn standard() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Topic::Metrics, on_metrics);
        dispatcher.register(Topic::Health, on_health);
        dispatcher.register(Topic::Tasks, on_tasks);
        dispatcher.register(Topic::TaskSummary, on_task_summary);
        dispatcher.register(Topic::Alerts, on_alerts);
        dispatcher.register(Topic::AlertSummary, on_alert_summary);
        dispatcher.register(Topic::NewMetric, on_new_metric);
        dispatcher.register(Topic::NewTask, on_new_task);
        dispatcher.register(Topic::NewAlert, on_new_alert);
        dispatcher
    }

    /// Register `handler` for `topic`, replacing any previous one
    pub fn register(&mut self, topic: Topic, handler: Handler) -> Option<Handler> {
        self.handlers.insert(topic, handler)
    }

    pub fn handler(&self, topic: Topic) -> Option<Handler> {
        self.handlers.get(&topic).copied()
    }

    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.handlers.keys().copied()
    }
}

fn on_metrics(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let samples: Vec<MetricSample> = serde_json::from_str(body)?;
    dashboard.apply_metrics(samples);
    Ok(())
}

fn on_health(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let report: HealthReport = serde_json::from_str(body)?;
    dashboard.apply_health(&report);
    Ok(())
}

fn on_tasks(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let tasks: Vec<Task> = serde_json::from_str(body)?;
    dashboard.apply_tasks(&tasks);
    Ok(())
}

fn on_task_summary(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let summary: TaskSummary = serde_json::from_str(body)?;
    dashboard.apply_task_summary(summary);
    Ok(())
}

fn on_alerts(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let alerts: Vec<Alert> = serde_json::from_str(body)?;
    dashboard.apply_alerts(&alerts);
    Ok(())
}

fn on_alert_summary(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let summary: AlertSummary = serde_json::from_str(body)?;
    dashboard.apply_alert_summary(summary);
    Ok(())
}

fn on_new_metric(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let sample: MetricSample = serde_json::from_str(body)?;
    dashboard.add_new_metric(sample);
    Ok(())
}

fn on_new_task(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let task: Task = serde_json::from_str(body)?;
    dashboard.add_new_task(task);
    Ok(())
}

fn on_new_alert(dashboard: &mut Dashboard, body: &str) -> Result<()> {
    let alert: Alert = serde_json::from_str(body)?;
    dashboard.add_new_alert(alert);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_topic() {
        let dispatcher = Dispatcher::standard();
        for topic in Topic::ALL {
            assert!(dispatcher.handler(topic).is_some(), "no handler for {}", topic);
        }
        assert_eq!(dispatcher.topics().count(), Topic::ALL.len());
    }

    #[test]
    fn test_register_replaces_handler() {
        fn noop(_: &mut Dashboard, _: &str) -> Result<()> {
            Ok(())
        }

        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.register(Topic::Health, noop).is_none());
        assert!(dispatcher.register(Topic::Health, on_health).is_some());
        assert!(dispatcher.handler(Topic::Tasks).is_none());
    }
}
