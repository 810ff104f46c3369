//! Plain-text rendering of the view-model for terminal front-ends

use super::DashboardView;
use crate::chart::ChartState;
use crate::format;
use chrono::NaiveDateTime;
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

impl DashboardView {
    /// Render the whole dashboard. `now` drives the relative alert times.
    pub fn render_text(&self, now: &NaiveDateTime) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_text(&mut out, now);
        out
    }

    fn write_text(&self, out: &mut String, now: &NaiveDateTime) -> std::fmt::Result {
        writeln!(out, "== System Monitor ==")?;

        match &self.health {
            Some(health) => writeln!(out, "Health: {} ({})", health.state.css_class(), health.caption)?,
            None => writeln!(out, "Health: -")?,
        }

        if let Some(g) = &self.gauges {
            writeln!(out, "CPU     {} {}", bar(g.cpu_bar), g.cpu)?;
            writeln!(out, "Memory  {} {}", bar(g.memory_bar), g.memory)?;
            writeln!(out, "Disk    {} {}", bar(g.disk_bar), g.disk)?;
            writeln!(out, "Load    {} {}", bar(g.load_bar), g.load)?;
            writeln!(out, "Net in  {}  Net out {}", g.network_in, g.network_out)?;
        }

        match self.chart_state() {
            ChartState::Ready => {
                if let (Some(first), Some(last)) = (self.time_series.labels().next(), self.time_series.labels().last()) {
                    let cpu: Vec<String> = self.time_series.cpu().map(|v| format!("{:.0}", v)).collect();
                    writeln!(out, "CPU trend {}..{}: {}", first, last, cpu.join(" "))?;
                }
                if !self.distribution.labels.is_empty() {
                    writeln!(out, "Distribution:")?;
                    let shares = self.distribution.shares();
                    let slices = self.distribution.labels.iter().zip(&self.distribution.values).zip(shares);
                    for ((label, value), share) in slices {
                        writeln!(out, "  {:<16} {} ({:.1}% of total)", label, format::percent(*value), share)?;
                    }
                }
            }
            ChartState::Pending => writeln!(out, "Charts loading...")?,
            ChartState::Unavailable => writeln!(out, "Charts unavailable")?,
        }

        if let Some(s) = &self.task_summary {
            writeln!(
                out,
                "Tasks: queued {} running {} failed {} completed {}",
                s.queued_count, s.running_count, s.failed_count, s.completed_count
            )?;
        }
        for row in self.tasks.iter().filter(|r| r.visible) {
            let t = &row.task;
            writeln!(
                out,
                "  #{:<5} {:<24} {:<12} {:>3}% {}",
                t.id,
                t.task_name,
                t.target_cluster,
                t.progress,
                format::status_text(t.status)
            )?;
        }

        if let Some(s) = &self.alert_summary {
            writeln!(
                out,
                "Alerts: unresolved {} (critical {}, high {}, medium {}, low {})",
                s.unresolved_count, s.critical_count, s.high_count, s.medium_count, s.low_count
            )?;
        }
        for row in self.alerts.iter().filter(|r| r.visible) {
            let a = &row.alert;
            writeln!(
                out,
                "  [{}] {}: {} ({})",
                format::severity_text(a.severity),
                a.source,
                a.message,
                format::time_ago(&a.timestamp, now)
            )?;
        }

        if !self.metrics_table.is_empty() {
            writeln!(out, "Latest samples:")?;
            for row in &self.metrics_table {
                writeln!(
                    out,
                    "  {:<12} {:<8} {:<10} cpu {:>6} mem {:>6} disk {:>6} load {} {}",
                    row.server, row.region, row.service, row.cpu, row.memory, row.disk, row.load, row.time
                )?;
            }
        }

        for notice in self.notices.active() {
            writeln!(out, "({}) {}", notice.level.tag(), notice.message)?;
        }

        Ok(())
    }
}
