use chrono::{DateTime, Utc};
use std::cmp;

use super::TimeRange;

/// Free sub-ranges of `[window_start, window_end)` not covered by `occupied`.
///
/// Occupied ranges may be unsorted, overlapping, or reach outside the window;
/// the output is sorted and pairwise disjoint.
pub fn gaps_within(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    occupied: &[TimeRange],
) -> Vec<TimeRange> {
    let window = TimeRange::new(window_start, window_end);
    if window.is_empty() {
        return Vec::new();
    }

    let mut clipped: Vec<TimeRange> = occupied
        .iter()
        .filter_map(|range| range.clip(&window))
        .collect();
    clipped.sort_by_key(|range| range.start);

    let mut gaps = Vec::with_capacity(clipped.len() + 1);
    let mut cursor = window_start;

    for range in clipped {
        if range.start > cursor {
            gaps.push(TimeRange::new(cursor, range.start));
        }
        cursor = cmp::max(cursor, range.end);
    }

    if cursor < window_end {
        gaps.push(TimeRange::new(cursor, window_end));
    }

    gaps
}

/// The free range around `point`, or `None` when the point is occupied or
/// falls outside `[range_start, range_end)`.
pub fn find_gap_containing_point(
    point: DateTime<Utc>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    occupied: &[TimeRange],
) -> Option<TimeRange> {
    if occupied.iter().any(|range| range.contains(point)) {
        return None;
    }

    gaps_within(range_start, range_end, occupied)
        .into_iter()
        .find(|gap| gap.contains(point))
}
