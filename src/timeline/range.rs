use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cmp;

/// Half-open `[start, end)` span of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Build a range from two instants in either order.
    pub fn ordered(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        Self {
            start: cmp::min(a, b),
            end: cmp::max(a, b),
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// `(startA < endB) && (endA > startB)`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Intersect with `window`; `None` when nothing of `self` lies inside it.
    pub fn clip(&self, window: &TimeRange) -> Option<TimeRange> {
        let clipped = TimeRange {
            start: cmp::max(self.start, window.start),
            end: cmp::min(self.end, window.end),
        };
        (!clipped.is_empty()).then_some(clipped)
    }

    pub fn overlap_ms(&self, other: &TimeRange) -> i64 {
        self.clip(other).map(|r| r.duration_ms()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    #[test]
    fn ordered_swaps_reversed_bounds() {
        let range = TimeRange::ordered(at(11, 0), at(9, 30));
        assert_eq!(range.start, at(9, 30));
        assert_eq!(range.end, at(11, 0));
        assert_eq!(range.duration(), TimeDelta::minutes(90));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = TimeRange::new(at(9, 0), at(10, 0));
        let b = TimeRange::new(at(10, 0), at(11, 0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&TimeRange::new(at(9, 59), at(10, 30))));
    }

    #[test]
    fn clip_drops_ranges_outside_window() {
        let window = TimeRange::new(at(9, 0), at(12, 0));
        let inside = TimeRange::new(at(8, 0), at(10, 0)).clip(&window).unwrap();
        assert_eq!(inside, TimeRange::new(at(9, 0), at(10, 0)));
        assert!(TimeRange::new(at(12, 0), at(13, 0)).clip(&window).is_none());
    }
}
