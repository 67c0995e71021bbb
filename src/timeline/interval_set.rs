use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::models::{EntryId, TimeEntry};

use super::{
    gaps::{find_gap_containing_point, gaps_within},
    Day, TimeRange,
};

/// Where an entry's neighbours end and begin; the day bounds stand in for
/// missing neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborBounds {
    pub previous_end: DateTime<Utc>,
    pub next_start: DateTime<Utc>,
}

/// Read-mostly projection of one day's time entries, sorted by start.
///
/// Equal starts are ordered by entry id so neighbour lookups are deterministic.
#[derive(Debug, Clone)]
pub struct IntervalSet {
    day: Day,
    entries: Vec<TimeEntry>,
}

impl IntervalSet {
    pub fn new(day: Day, mut entries: Vec<TimeEntry>) -> Self {
        entries.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

        let set = Self { day, entries };
        if !set.is_consistent() {
            warn!(
                "entry store returned overlapping or empty entries for {}",
                day.date()
            );
        }
        set
    }

    pub fn empty(day: Day) -> Self {
        Self {
            day,
            entries: Vec::new(),
        }
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&TimeEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn neighbor_bounds_of(&self, id: EntryId) -> Option<NeighborBounds> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;

        let previous_end = index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|entry| entry.end)
            .unwrap_or_else(|| self.day.start());
        let next_start = self
            .entries
            .get(index + 1)
            .map(|entry| entry.start)
            .unwrap_or_else(|| self.day.end());

        Some(NeighborBounds {
            previous_end,
            next_start,
        })
    }

    pub fn entry_at(&self, at: DateTime<Utc>) -> Option<&TimeEntry> {
        self.entries.iter().find(|entry| entry.contains(at))
    }

    pub fn occupied_ranges(&self) -> Vec<TimeRange> {
        self.entries.iter().map(TimeEntry::range).collect()
    }

    pub fn gaps_within(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<TimeRange> {
        gaps_within(window_start, window_end, &self.occupied_ranges())
    }

    /// Free range of the day around `at`, `None` when an entry covers it.
    pub fn gap_containing(&self, at: DateTime<Utc>) -> Option<TimeRange> {
        find_gap_containing_point(at, self.day.start(), self.day.end(), &self.occupied_ranges())
    }

    /// Whether `range` would collide with any entry other than `excluding`.
    pub fn would_overlap(&self, range: &TimeRange, excluding: Option<EntryId>) -> bool {
        self.entries
            .iter()
            .filter(|entry| Some(entry.id) != excluding)
            .any(|entry| entry.range().overlaps(range))
    }

    /// `end > start` for every entry and no two entries overlap.
    pub fn is_consistent(&self) -> bool {
        self.entries.iter().all(|entry| entry.end > entry.start)
            && self
                .entries
                .windows(2)
                .all(|pair| pair[0].end <= pair[1].start)
    }
}
