//! Metric aggregation
//!
//! Reduces a batch of metric samples into gauge averages, a per-dimension
//! CPU distribution and a time-ordered chart projection. Empty input never
//! produces a summary, so callers cannot divide by zero.

use crate::format;
use crate::model::{HealthState, MetricSample};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Maximum number of groups shown in the distribution chart
pub const MAX_DISTRIBUTION_GROUPS: usize = 8;

/// Arithmetic means over a non-empty batch of samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub avg_cpu: f64,
    pub avg_memory: f64,
    pub avg_disk: f64,
    pub avg_load: f64,
    pub avg_network_in: f64,
    pub avg_network_out: f64,
    pub sample_count: usize,
}

impl MetricSummary {
    /// Returns `None` for an empty batch.
    pub fn from_samples(samples: &[MetricSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = |field: fn(&MetricSample) -> f64| samples.iter().map(field).sum::<f64>() / n;

        Some(Self {
            avg_cpu: mean(|m| m.cpu_usage),
            avg_memory: mean(|m| m.memory_usage),
            avg_disk: mean(|m| m.disk_usage),
            avg_load: mean(|m| m.load_average),
            avg_network_in: mean(|m| m.network_in),
            avg_network_out: mean(|m| m.network_out),
            sample_count: samples.len(),
        })
    }
}

/// Health thresholds used by the monitoring backend
pub fn classify_health(avg_cpu: f64, avg_memory: f64, avg_load: f64) -> HealthState {
    if avg_cpu > 85.0 || avg_memory > 90.0 || avg_load > 5.0 {
        HealthState::Unhealthy
    } else if avg_cpu > 70.0 || avg_memory > 75.0 || avg_load > 3.0 {
        HealthState::Warning
    } else {
        HealthState::Healthy
    }
}

/// Grouping key for the distribution chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    #[default]
    Server,
    Region,
    Service,
}

impl Dimension {
    pub fn key<'a>(&self, sample: &'a MetricSample) -> &'a str {
        match self {
            Self::Server => &sample.server_name,
            Self::Region => &sample.region,
            Self::Service => &sample.service_type,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Region => "region",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "region" => Ok(Self::Region),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown dimension '{}'", other)),
        }
    }
}

/// One slice of the distribution chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionGroup {
    pub key: String,
    pub count: usize,
    pub avg_cpu: f64,
}

/// Group samples by `dimension`, rank by mean CPU (descending) and keep the
/// top [`MAX_DISTRIBUTION_GROUPS`]. Equal means keep first-seen order.
pub fn group_by_dimension(samples: &[MetricSample], dimension: Dimension) -> Vec<DimensionGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, usize, f64)> = Vec::new();

    for sample in samples {
        let key = dimension.key(sample);
        let slot = *index.entry(key).or_insert_with(|| {
            totals.push((key, 0, 0.0));
            totals.len() - 1
        });
        totals[slot].1 += 1;
        totals[slot].2 += sample.cpu_usage;
    }

    let mut groups: Vec<DimensionGroup> = totals
        .into_iter()
        .map(|(key, count, total_cpu)| DimensionGroup {
            key: key.to_string(),
            count,
            avg_cpu: total_cpu / count as f64,
        })
        .collect();

    // sort_by is stable
    groups.sort_by(|a, b| b.avg_cpu.partial_cmp(&a.avg_cpu).unwrap_or(Ordering::Equal));
    groups.truncate(MAX_DISTRIBUTION_GROUPS);
    groups
}

/// Parallel label/value arrays for the CPU and memory line chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub labels: Vec<String>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Order samples by timestamp (stable) and project them onto chart arrays.
/// Values are plotted as-is, no resampling.
pub fn project_time_series(samples: &[MetricSample]) -> TimeSeries {
    let mut ordered: Vec<&MetricSample> = samples.iter().collect();
    ordered.sort_by_key(|m| m.timestamp);

    TimeSeries {
        labels: ordered.iter().map(|m| format::format_time(&m.timestamp)).collect(),
        cpu: ordered.iter().map(|m| m.cpu_usage).collect(),
        memory: ordered.iter().map(|m| m.memory_usage).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn ts(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(sec as i64)
    }

    fn sample(server: &str, region: &str, cpu: f64, sec: u32) -> MetricSample {
        MetricSample {
            id: None,
            server_name: server.to_string(),
            region: region.to_string(),
            service_type: "web".to_string(),
            cpu_usage: cpu,
            memory_usage: cpu / 2.0,
            disk_usage: 40.0,
            network_in: 300.0,
            network_out: 100.0,
            load_average: 2.0,
            timestamp: ts(sec),
        }
    }

    #[test]
    fn test_summary_of_empty_batch_is_none() {
        assert!(MetricSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_average_cpu_of_three_samples() {
        let samples = vec![
            sample("a", "east", 10.0, 0),
            sample("b", "east", 20.0, 1),
            sample("c", "east", 30.0, 2),
        ];

        let summary = MetricSummary::from_samples(&samples).unwrap();
        assert_eq!(summary.avg_cpu, 20.0);
        assert_eq!(format::percent(summary.avg_cpu), "20.0%");
        assert_eq!(summary.avg_memory, 10.0);
        assert_eq!(summary.sample_count, 3);
    }

    #[test]
    fn test_group_by_region_caps_at_eight() {
        let samples: Vec<_> = (0..9)
            .map(|i| sample("s", &format!("region-{}", i), i as f64 * 10.0, i))
            .collect();

        let groups = group_by_dimension(&samples, Dimension::Region);
        assert_eq!(groups.len(), 8);
        assert_eq!(groups[0].key, "region-8");
        assert!(groups.iter().all(|g| g.key != "region-0"));
    }

    #[test]
    fn test_group_ties_keep_first_seen_order() {
        let samples = vec![
            sample("beta", "r", 50.0, 0),
            sample("alpha", "r", 50.0, 1),
            sample("gamma", "r", 90.0, 2),
        ];

        let groups = group_by_dimension(&samples, Dimension::Server);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["gamma", "beta", "alpha"]);
    }

    #[test]
    fn test_group_means_and_counts() {
        let samples = vec![
            sample("a", "r", 10.0, 0),
            sample("a", "r", 30.0, 1),
            sample("b", "r", 25.0, 2),
        ];

        let groups = group_by_dimension(&samples, Dimension::Server);
        assert_eq!(groups[0], DimensionGroup { key: "b".into(), count: 1, avg_cpu: 25.0 });
        assert_eq!(groups[1], DimensionGroup { key: "a".into(), count: 2, avg_cpu: 20.0 });
    }

    #[test]
    fn test_time_series_sorted_by_timestamp() {
        let samples = vec![
            sample("a", "r", 30.0, 20),
            sample("b", "r", 10.0, 0),
            sample("c", "r", 20.0, 10),
        ];

        let series = project_time_series(&samples);
        assert_eq!(series.cpu, vec![10.0, 20.0, 30.0]);
        assert_eq!(series.memory, vec![5.0, 10.0, 15.0]);
        assert_eq!(series.labels[0], "2024-03-01 10:00:00");
    }

    #[test]
    fn test_dimension_parsing() {
        assert_eq!("region".parse::<Dimension>().unwrap(), Dimension::Region);
        assert_eq!(" Service ".parse::<Dimension>().unwrap(), Dimension::Service);
        assert!("rack".parse::<Dimension>().is_err());
        assert_eq!(Dimension::default(), Dimension::Server);
    }

    #[test]
    fn test_classify_health_thresholds() {
        assert_eq!(classify_health(50.0, 50.0, 1.0), HealthState::Healthy);
        assert_eq!(classify_health(71.0, 50.0, 1.0), HealthState::Warning);
        assert_eq!(classify_health(50.0, 50.0, 3.5), HealthState::Warning);
        assert_eq!(classify_health(50.0, 91.0, 1.0), HealthState::Unhealthy);
        assert_eq!(classify_health(86.0, 50.0, 1.0), HealthState::Unhealthy);
    }

    proptest! {
        #[test]
        fn prop_mean_matches_arithmetic_mean(cpus in prop::collection::vec(0.0f64..100.0, 1..50)) {
            let samples: Vec<_> = cpus.iter().enumerate()
                .map(|(i, c)| sample("s", "r", *c, i as u32))
                .collect();
            let summary = MetricSummary::from_samples(&samples).unwrap();
            let expected = cpus.iter().sum::<f64>() / cpus.len() as f64;
            prop_assert!((summary.avg_cpu - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_groups_bounded_and_sorted(
            rows in prop::collection::vec((0usize..12, 0.0f64..100.0), 0..60)
        ) {
            let samples: Vec<_> = rows.iter().enumerate()
                .map(|(i, (k, c))| sample(&format!("srv-{}", k), "r", *c, i as u32))
                .collect();
            let groups = group_by_dimension(&samples, Dimension::Server);

            prop_assert!(groups.len() <= MAX_DISTRIBUTION_GROUPS);
            for pair in groups.windows(2) {
                prop_assert!(pair[0].avg_cpu >= pair[1].avg_cpu);
            }

            let distinct: std::collections::HashSet<_> = rows.iter().map(|(k, _)| *k).collect();
            if distinct.len() <= MAX_DISTRIBUTION_GROUPS {
                let total: usize = groups.iter().map(|g| g.count).sum();
                prop_assert_eq!(total, samples.len());
            }
        }
    }
}
