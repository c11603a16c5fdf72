//! Chart aggregation over sparse per-user progress series
//!
//! Turns a [`ProgressSeries`] into labels plus one numeric sequence per
//! username. Cumulative mode renders a missing user as a gap (`None`) so
//! the line breaks instead of dropping to zero; delta mode renders a
//! missing endpoint as `0` ("no progress"). The asymmetry is deliberate.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Timelike};

use crate::types::{ProblemStats, ProgressSeries, TimeSeriesPoint};

/// Bucket width of the input data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartInterval {
    Hour,
    #[default]
    Day,
}

impl ChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartInterval::Hour => "hour",
            ChartInterval::Day => "day",
        }
    }

    /// Bucket width in hours, as the backend expects it.
    pub fn hours(&self) -> u32 {
        match self {
            ChartInterval::Hour => 1,
            ChartInterval::Day => 24,
        }
    }
}

impl FromStr for ChartInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(ChartInterval::Hour),
            "day" => Ok(ChartInterval::Day),
            _ => Err(format!("unknown chart interval: {}", s)),
        }
    }
}

/// Cumulative totals or period-over-period change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartMode {
    Total,
    #[default]
    Delta,
}

impl ChartMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartMode::Total => "total",
            ChartMode::Delta => "delta",
        }
    }
}

impl FromStr for ChartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(ChartMode::Total),
            "delta" => Ok(ChartMode::Delta),
            _ => Err(format!("unknown chart mode: {}", s)),
        }
    }
}

/// Which difficulty bucket to plot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartDifficulty {
    Easy,
    Medium,
    Hard,
    /// Medium and hard combined
    MedHard,
    #[default]
    Total,
}

impl ChartDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartDifficulty::Easy => "easy",
            ChartDifficulty::Medium => "medium",
            ChartDifficulty::Hard => "hard",
            ChartDifficulty::MedHard => "med_hard",
            ChartDifficulty::Total => "total",
        }
    }

    /// Extract this difficulty's count from a stats record.
    pub fn extract(&self, stats: &ProblemStats) -> i64 {
        match self {
            ChartDifficulty::Easy => stats.easy,
            ChartDifficulty::Medium => stats.medium,
            ChartDifficulty::Hard => stats.hard,
            ChartDifficulty::MedHard => stats.medium + stats.hard,
            ChartDifficulty::Total => stats.total,
        }
    }
}

impl FromStr for ChartDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(ChartDifficulty::Easy),
            "medium" => Ok(ChartDifficulty::Medium),
            "hard" => Ok(ChartDifficulty::Hard),
            "med_hard" => Ok(ChartDifficulty::MedHard),
            "total" => Ok(ChartDifficulty::Total),
            _ => Err(format!("unknown chart difficulty: {}", s)),
        }
    }
}

/// Chart-ready labels and per-user numeric sequences.
///
/// Invariant: every dataset has exactly `labels.len()` entries. `None`
/// marks a gap (no data), which is distinct from `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: BTreeMap<String, Vec<Option<i64>>>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Format one axis label.
///
/// Hour-bucketed charts label points as `HH:MM`, except at exact midnight
/// where the day boundary is marked as `MM/DD` instead. Day-bucketed
/// charts always label `MM/DD`. The offset shifts labels only; bucketing
/// happened on the server.
fn format_label(timestamp: i64, interval: ChartInterval, offset: &FixedOffset) -> String {
    let utc = DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH);
    let local = utc.with_timezone(offset);
    match interval {
        ChartInterval::Day => local.format("%m/%d").to_string(),
        ChartInterval::Hour => {
            if local.hour() == 0 && local.minute() == 0 {
                local.format("%m/%d").to_string()
            } else {
                local.format("%H:%M").to_string()
            }
        }
    }
}

/// Aggregate a progress series into a chart series.
///
/// A delta series has one fewer point than a total series (the first delta
/// has no predecessor), so delta mode drops the first label.
pub fn aggregate(
    series: &ProgressSeries,
    interval: ChartInterval,
    mode: ChartMode,
    difficulty: ChartDifficulty,
    label_offset: FixedOffset,
) -> ChartSeries {
    let mut points: Vec<&TimeSeriesPoint> = series.points.iter().collect();
    // The series invariant already orders points; sort defensively anyway.
    points.sort_by_key(|p| p.timestamp);

    let full_labels: Vec<String> = points
        .iter()
        .map(|p| format_label(p.timestamp, interval, &label_offset))
        .collect();
    let labels = match mode {
        ChartMode::Total => full_labels,
        ChartMode::Delta => full_labels.into_iter().skip(1).collect(),
    };

    let mut datasets = BTreeMap::new();
    for username in &series.usernames {
        let data: Vec<Option<i64>> = match mode {
            ChartMode::Total => points
                .iter()
                .map(|p| p.per_user.get(username).map(|s| difficulty.extract(s)))
                .collect(),
            ChartMode::Delta => points
                .windows(2)
                .map(|pair| {
                    match (
                        pair[0].per_user.get(username),
                        pair[1].per_user.get(username),
                    ) {
                        (Some(prev), Some(curr)) => {
                            Some(difficulty.extract(curr) - difficulty.extract(prev))
                        }
                        // Missing either endpoint means "no progress",
                        // zero-filled rather than a gap.
                        _ => Some(0),
                    }
                })
                .collect(),
        };
        datasets.insert(username.clone(), data);
    }

    ChartSeries { labels, datasets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn stats(total: i64) -> ProblemStats {
        ProblemStats {
            total,
            ..Default::default()
        }
    }

    fn sample_series() -> ProgressSeries {
        ProgressSeries::from_points(vec![
            TimeSeriesPoint {
                timestamp: 1_700_000_000,
                per_user: HashMap::from([("A".to_string(), stats(5))]),
            },
            TimeSeriesPoint {
                timestamp: 1_700_003_600,
                per_user: HashMap::from([("A".to_string(), stats(8))]),
            },
            TimeSeriesPoint {
                timestamp: 1_700_007_200,
                per_user: HashMap::from([("B".to_string(), stats(2))]),
            },
        ])
    }

    #[test]
    fn test_total_mode_gaps_are_null() {
        let chart = aggregate(
            &sample_series(),
            ChartInterval::Hour,
            ChartMode::Total,
            ChartDifficulty::Total,
            utc(),
        );

        assert_eq!(chart.labels.len(), 3);
        assert_eq!(chart.datasets["A"], vec![Some(5), Some(8), None]);
        assert_eq!(chart.datasets["B"], vec![None, None, Some(2)]);
    }

    #[test]
    fn test_delta_mode_zero_fills_missing_users() {
        let chart = aggregate(
            &sample_series(),
            ChartInterval::Hour,
            ChartMode::Delta,
            ChartDifficulty::Total,
            utc(),
        );

        // One fewer label than total mode.
        assert_eq!(chart.labels.len(), 2);
        // A present at t1 and t2 (delta 3), missing at t3 (zero).
        assert_eq!(chart.datasets["A"], vec![Some(3), Some(0)]);
        // B missing at t1 and t2: zero, not a gap.
        assert_eq!(chart.datasets["B"], vec![Some(0), Some(0)]);
    }

    #[test]
    fn test_datasets_match_label_length() {
        for mode in [ChartMode::Total, ChartMode::Delta] {
            let chart = aggregate(
                &sample_series(),
                ChartInterval::Day,
                mode,
                ChartDifficulty::Total,
                utc(),
            );
            for data in chart.datasets.values() {
                assert_eq!(data.len(), chart.labels.len());
            }
        }
    }

    #[test]
    fn test_hour_labels_mark_midnight() {
        // 2023-11-15 00:00:00 UTC
        let midnight = 1_700_006_400;
        let series = ProgressSeries::from_points(vec![
            TimeSeriesPoint {
                timestamp: midnight - 3600,
                per_user: HashMap::from([("A".to_string(), stats(1))]),
            },
            TimeSeriesPoint {
                timestamp: midnight,
                per_user: HashMap::from([("A".to_string(), stats(2))]),
            },
        ]);

        let chart = aggregate(
            &series,
            ChartInterval::Hour,
            ChartMode::Total,
            ChartDifficulty::Total,
            utc(),
        );
        assert_eq!(chart.labels, vec!["23:00".to_string(), "11/15".to_string()]);
    }

    #[test]
    fn test_day_labels_are_dates() {
        let chart = aggregate(
            &sample_series(),
            ChartInterval::Day,
            ChartMode::Total,
            ChartDifficulty::Total,
            utc(),
        );
        for label in &chart.labels {
            assert!(label.contains('/'), "expected MM/DD label, got {label}");
        }
    }

    #[test]
    fn test_label_offset_shifts_formatting_only() {
        // 2023-11-15 00:00:00 UTC is 08:00 in +08:00.
        let series = ProgressSeries::from_points(vec![TimeSeriesPoint {
            timestamp: 1_700_006_400,
            per_user: HashMap::from([("A".to_string(), stats(1))]),
        }]);

        let taipei = FixedOffset::east_opt(8 * 3600).unwrap();
        let chart = aggregate(
            &series,
            ChartInterval::Hour,
            ChartMode::Total,
            ChartDifficulty::Total,
            taipei,
        );
        assert_eq!(chart.labels, vec!["08:00".to_string()]);
    }

    #[test]
    fn test_med_hard_sums_medium_and_hard() {
        let stats = ProblemStats {
            easy: 10,
            medium: 5,
            hard: 2,
            total: 17,
        };
        assert_eq!(ChartDifficulty::MedHard.extract(&stats), 7);
        assert_eq!(ChartDifficulty::Total.extract(&stats), 17);
        assert_eq!(ChartDifficulty::Easy.extract(&stats), 10);
    }

    #[test]
    fn test_empty_series_yields_empty_chart() {
        let chart = aggregate(
            &ProgressSeries::default(),
            ChartInterval::Day,
            ChartMode::Delta,
            ChartDifficulty::Total,
            utc(),
        );
        assert!(chart.is_empty());
        assert!(chart.datasets.is_empty());
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(
            "hour".parse::<ChartInterval>().unwrap(),
            ChartInterval::Hour
        );
        assert_eq!("delta".parse::<ChartMode>().unwrap(), ChartMode::Delta);
        assert_eq!(
            "med_hard".parse::<ChartDifficulty>().unwrap(),
            ChartDifficulty::MedHard
        );
        assert!("weekly".parse::<ChartInterval>().is_err());
        assert_eq!(ChartDifficulty::MedHard.as_str(), "med_hard");
    }
}
