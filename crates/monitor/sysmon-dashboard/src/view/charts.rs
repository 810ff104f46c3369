//! Chart view-models

use crate::aggregator::{DimensionGroup, TimeSeries};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Points kept by the live time-series chart
pub const TIME_SERIES_CAPACITY: usize = 20;

/// CPU and memory line chart backed by a bounded ring buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesChart {
    capacity: usize,
    labels: VecDeque<String>,
    cpu: VecDeque<f64>,
    memory: VecDeque<f64>,
}

impl Default for TimeSeriesChart {
    fn default() -> Self {
        Self::with_capacity(TIME_SERIES_CAPACITY)
    }
}

impl TimeSeriesChart {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            labels: VecDeque::with_capacity(capacity),
            cpu: VecDeque::with_capacity(capacity),
            memory: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Replace the whole series, keeping the newest `capacity` points.
    pub fn replace(&mut self, series: TimeSeries) {
        let skip = series.len().saturating_sub(self.capacity);
        self.labels = series.labels.into_iter().skip(skip).collect();
        self.cpu = series.cpu.into_iter().skip(skip).collect();
        self.memory = series.memory.into_iter().skip(skip).collect();
    }

    /// Append one point. The oldest point is dropped from every array first
    /// when the buffer is full.
    pub fn push(&mut self, label: String, cpu: f64, memory: f64) {
        if self.labels.len() >= self.capacity {
            self.labels.pop_front();
            self.cpu.pop_front();
            self.memory.pop_front();
        }
        self.labels.push_back(label);
        self.cpu.push_back(cpu);
        self.memory.push_back(memory);
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn cpu(&self) -> impl Iterator<Item = f64> + '_ {
        self.cpu.iter().copied()
    }

    pub fn memory(&self) -> impl Iterator<Item = f64> + '_ {
        self.memory.iter().copied()
    }
}

/// Doughnut chart of mean CPU per group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl DistributionChart {
    pub fn replace(&mut self, groups: &[DimensionGroup]) {
        self.labels = groups.iter().map(|g| g.key.clone()).collect();
        self.values = groups.iter().map(|g| g.avg_cpu).collect();
    }

    /// Share of each slice in percent, as the chart tooltip shows it
    pub fn shares(&self) -> Vec<f64> {
        let total: f64 = self.values.iter().sum();
        self.values
            .iter()
            .map(|v| if total > 0.0 { v / total * 100.0 } else { 0.0 })
            .collect()
    }
}
