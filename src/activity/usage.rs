use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::ProcessSample;
use crate::timeline::TimeRange;

/// Active span credited to the last sample when no later sample bounds it.
pub const DEFAULT_LAST_SAMPLE_TAIL_MS: i64 = 1_000;

/// One row of a top-processes ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessUsage {
    pub process_name: String,
    pub seconds: u64,
    pub percent: f64,
}

/// Per-process seconds, remembering the order processes were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageBuckets {
    order: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl UsageBuckets {
    pub fn add(&mut self, process_name: &str, seconds: u64) {
        match self.index.get(process_name) {
            Some(&i) => self.order[i].1 += seconds,
            None => {
                self.index.insert(process_name.to_string(), self.order.len());
                self.order.push((process_name.to_string(), seconds));
            }
        }
    }

    pub fn get(&self, process_name: &str) -> u64 {
        self.index
            .get(process_name)
            .map(|&i| self.order[i].1)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_seconds(&self) -> u64 {
        self.order.iter().map(|(_, seconds)| seconds).sum()
    }

    /// Buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order.iter().map(|(name, seconds)| (name.as_str(), *seconds))
    }

    /// Busiest first, ties kept in first-seen order. Percentages are relative
    /// to every bucket, not only the returned ones.
    pub fn ranked(&self, limit: usize) -> Vec<ProcessUsage> {
        let total = self.total_seconds();
        if total == 0 {
            return Vec::new();
        }

        let mut rows: Vec<&(String, u64)> = self.order.iter().collect();
        // sort_by is stable, which keeps first-seen order on ties.
        rows.sort_by(|a, b| b.1.cmp(&a.1));

        rows.into_iter()
            .take(limit)
            .map(|(name, seconds)| ProcessUsage {
                process_name: name.clone(),
                seconds: *seconds,
                percent: 100.0 * *seconds as f64 / total as f64,
            })
            .collect()
    }

    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<(&str, u64)> = None;
        for (name, seconds) in self.iter() {
            if seconds > 0 && best.map_or(true, |(_, top)| seconds > top) {
                best = Some((name, seconds));
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Time-ordered process samples with forward-fill duration inference.
///
/// Sample `i` is active on `[t_i, t_{i+1})`; the last sample on
/// `[t_last, t_last + tail)`.
#[derive(Debug, Clone)]
pub struct ActivityTimeline {
    samples: Vec<ProcessSample>,
    tail: TimeDelta,
}

impl Default for ActivityTimeline {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ActivityTimeline {
    pub fn new(samples: Vec<ProcessSample>) -> Self {
        Self::with_tail(samples, TimeDelta::milliseconds(DEFAULT_LAST_SAMPLE_TAIL_MS))
    }

    pub fn with_tail(mut samples: Vec<ProcessSample>, tail: TimeDelta) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self { samples, tail }
    }

    pub fn samples(&self) -> &[ProcessSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn active_range(&self, i: usize) -> TimeRange {
        let start = self.samples[i].timestamp;
        let end = self
            .samples
            .get(i + 1)
            .map(|next| next.timestamp)
            .unwrap_or(start + self.tail);
        TimeRange::new(start, end)
    }

    /// Index of the first sample whose active range could reach `at`.
    fn first_relevant(&self, at: DateTime<Utc>) -> usize {
        self.samples
            .partition_point(|sample| sample.timestamp <= at)
            .saturating_sub(1)
    }

    pub fn aggregate_usage(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> UsageBuckets {
        let mut buckets = UsageBuckets::default();
        let window = TimeRange::new(start, end);
        if window.is_empty() {
            return buckets;
        }

        for i in self.first_relevant(start)..self.samples.len() {
            if self.samples[i].timestamp >= end {
                break;
            }
            let overlap_ms = self.active_range(i).overlap_ms(&window);
            if overlap_ms > 0 {
                let seconds = ((overlap_ms + 500) / 1000).max(1) as u64;
                buckets.add(&self.samples[i].process_name, seconds);
            }
        }

        buckets
    }

    pub fn top_processes(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Vec<ProcessUsage> {
        self.aggregate_usage(start, end).ranked(limit)
    }

    /// Foreground process at `at`, if any sample covers it.
    pub fn process_at(&self, at: DateTime<Utc>) -> Option<&str> {
        let i = self.samples.partition_point(|sample| sample.timestamp <= at);
        if i == 0 {
            return None;
        }
        let i = i - 1;
        self.active_range(i)
            .contains(at)
            .then(|| self.samples[i].process_name.as_str())
    }
}
