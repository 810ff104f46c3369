//! Display formatting for raw values
//!
//! Pure functions only. Everything the view shows as text goes through here.

use crate::model::{AlertSeverity, HealthState, TaskStatus};
use chrono::NaiveDateTime;

/// Format a sample or task timestamp as a chart/table label
pub fn format_time(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Coarse relative time, e.g. "just now", "5 min ago", "3 h ago", "2 d ago"
pub fn time_ago(timestamp: &NaiveDateTime, now: &NaiveDateTime) -> String {
    let diff_mins = (*now - *timestamp).num_minutes();

    if diff_mins < 1 {
        return "just now".to_string();
    }
    if diff_mins < 60 {
        return format!("{} min ago", diff_mins);
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{} h ago", diff_hours);
    }

    format!("{} d ago", diff_hours / 24)
}

pub fn status_text(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Queued => "Queued",
        TaskStatus::Running => "Running",
        TaskStatus::Failed => "Failed",
        TaskStatus::Completed => "Completed",
    }
}

pub fn severity_text(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Low => "Low",
        AlertSeverity::Medium => "Medium",
        AlertSeverity::High => "High",
        AlertSeverity::Critical => "Critical",
    }
}

/// Caption shown next to the health light
pub fn load_balance_text(state: HealthState) -> &'static str {
    match state {
        HealthState::Healthy => "Load balance: normal",
        HealthState::Warning => "Load balance: slightly skewed",
        HealthState::Unhealthy => "Load balance: severely skewed",
    }
}

/// Percentage with one decimal, e.g. `20.0%`
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Network throughput, e.g. `512 MB/s`
pub fn rate(value: f64) -> String {
    format!("{:.0} MB/s", value)
}

/// Load average with two decimals
pub fn load(value: f64) -> String {
    format!("{:.2}", value)
}

/// Progress-bar width for the load gauge. A load of 8 fills the bar.
pub fn load_bar_width(avg_load: f64) -> f64 {
    (avg_load * 12.5).min(100.0)
}
