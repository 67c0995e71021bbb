use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntryId, TimeEntry};
use crate::timeline::{NeighborBounds, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeEdge {
    Start,
    End,
}

/// Inclusive range the dragged edge may move within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeBoundaries {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl ResizeBoundaries {
    pub fn for_edge(
        edge: ResizeEdge,
        current: TimeRange,
        neighbors: NeighborBounds,
        min_duration: TimeDelta,
    ) -> Self {
        match edge {
            ResizeEdge::Start => Self {
                min: neighbors.previous_end,
                max: current.end - min_duration,
            },
            ResizeEdge::End => Self {
                min: current.start + min_duration,
                max: neighbors.next_start,
            },
        }
    }

    pub fn has_room(&self) -> bool {
        self.max > self.min
    }

    pub fn clamp(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        at.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub entry_id: EntryId,
    pub edge: ResizeEdge,
    pub original: TimeRange,
    pub preview: TimeRange,
    pub bounds: ResizeBoundaries,
}

impl ResizeSession {
    pub fn changed(&self) -> bool {
        self.preview != self.original
    }
}

/// Why a pointer-down on a handle did not start a resize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeRefused {
    #[error("entry {0} has no room to resize")]
    NoRoom(EntryId),
    #[error("entry {0} is not on this day")]
    UnknownEntry(EntryId),
    #[error("another interaction is in progress")]
    Busy,
}

/// One-shot flag that swallows the entry click the browser fires right after
/// a resize ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClickSuppression {
    #[default]
    Disarmed,
    Armed,
    /// Resize ended; cleared on the next tick.
    Releasing,
}

impl ClickSuppression {
    pub fn is_armed(&self) -> bool {
        !matches!(self, ClickSuppression::Disarmed)
    }

    /// Returns `true` when the click should be swallowed.
    pub fn consume_click(&mut self) -> bool {
        let swallowed = self.is_armed();
        *self = ClickSuppression::Disarmed;
        swallowed
    }

    pub fn on_tick(&mut self) {
        if *self == ClickSuppression::Releasing {
            *self = ClickSuppression::Disarmed;
        }
    }
}

#[derive(Debug)]
pub struct ResizeController {
    min_duration: TimeDelta,
    session: Option<ResizeSession>,
    suppression: ClickSuppression,
}

impl ResizeController {
    pub fn new(min_duration: TimeDelta) -> Self {
        Self {
            min_duration,
            session: None,
            suppression: ClickSuppression::Disarmed,
        }
    }

    pub fn session(&self) -> Option<&ResizeSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn preview(&self) -> Option<(EntryId, TimeRange)> {
        self.session
            .as_ref()
            .map(|session| (session.entry_id, session.preview))
    }

    pub fn begin(
        &mut self,
        entry: &TimeEntry,
        edge: ResizeEdge,
        neighbors: NeighborBounds,
    ) -> Result<(), ResizeRefused> {
        if self.session.is_some() {
            return Err(ResizeRefused::Busy);
        }

        let original = entry.range();
        let bounds = ResizeBoundaries::for_edge(edge, original, neighbors, self.min_duration);
        if !bounds.has_room() {
            return Err(ResizeRefused::NoRoom(entry.id));
        }

        self.suppression = ClickSuppression::Armed;
        self.session = Some(ResizeSession {
            entry_id: entry.id,
            edge,
            original,
            preview: original,
            bounds,
        });
        Ok(())
    }

    /// Moves the dragged edge to `at`, clamped into the session bounds.
    pub fn update(&mut self, at: DateTime<Utc>) -> Option<TimeRange> {
        let session = self.session.as_mut()?;
        let clamped = session.bounds.clamp(at);
        match session.edge {
            ResizeEdge::Start => session.preview.start = clamped,
            ResizeEdge::End => session.preview.end = clamped,
        }
        Some(session.preview)
    }

    /// Ends the session; yields the new range only when it differs from the
    /// original.
    pub fn finish(&mut self) -> Option<(EntryId, TimeRange)> {
        let session = self.session.take()?;
        self.suppression = ClickSuppression::Releasing;
        session
            .changed()
            .then_some((session.entry_id, session.preview))
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            self.suppression = ClickSuppression::Releasing;
        }
    }

    pub fn consume_click(&mut self) -> bool {
        self.suppression.consume_click()
    }

    pub fn on_tick(&mut self) {
        self.suppression.on_tick();
    }

    pub fn suppression(&self) -> ClickSuppression {
        self.suppression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    fn entry_b() -> TimeEntry {
        TimeEntry {
            id: EntryId(2),
            start: at(14, 0),
            end: at(15, 30),
            label: "B".into(),
            category_id: None,
        }
    }

    fn after_a() -> NeighborBounds {
        NeighborBounds {
            previous_end: at(10, 0),
            next_start: at(0, 0) + TimeDelta::days(1),
        }
    }

    fn controller() -> ResizeController {
        ResizeController::new(TimeDelta::minutes(1))
    }

    #[test]
    fn start_edge_clamps_at_previous_neighbour() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::Start, after_a()).unwrap();

        assert_eq!(resize.update(at(9, 30)), Some(TimeRange::new(at(10, 0), at(15, 30))));
        assert_eq!(
            resize.finish(),
            Some((EntryId(2), TimeRange::new(at(10, 0), at(15, 30))))
        );
        assert!(!resize.is_active());
    }

    #[test]
    fn edges_respect_minimum_duration() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::End, after_a()).unwrap();
        let preview = resize.update(at(13, 0)).unwrap();
        assert_eq!(preview.end, at(14, 1));

        let (_, range) = resize.finish().unwrap();
        let bounds = ResizeBoundaries::for_edge(
            ResizeEdge::End,
            entry_b().range(),
            after_a(),
            TimeDelta::minutes(1),
        );
        assert!(range.start < range.end);
        assert!(bounds.min <= range.end && range.end <= bounds.max);
    }

    #[test]
    fn unchanged_preview_emits_nothing() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::End, after_a()).unwrap();
        resize.update(at(16, 0));
        resize.update(at(15, 30));
        assert_eq!(resize.finish(), None);
    }

    #[test]
    fn refuses_when_there_is_no_room() {
        let tight = TimeEntry {
            id: EntryId(5),
            start: at(10, 0),
            end: at(10, 1),
            label: "tight".into(),
            category_id: None,
        };
        let neighbors = NeighborBounds {
            previous_end: at(10, 0),
            next_start: at(10, 1),
        };
        let mut resize = controller();
        assert_eq!(
            resize.begin(&tight, ResizeEdge::Start, neighbors),
            Err(ResizeRefused::NoRoom(EntryId(5)))
        );
        assert!(!resize.is_active());
        assert_eq!(resize.suppression(), ClickSuppression::Disarmed);
    }

    #[test]
    fn second_begin_is_refused_while_resizing() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::End, after_a()).unwrap();
        assert_eq!(
            resize.begin(&entry_b(), ResizeEdge::Start, after_a()),
            Err(ResizeRefused::Busy)
        );
    }

    #[test]
    fn click_after_resize_is_swallowed_once() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::End, after_a()).unwrap();
        resize.finish();

        assert!(resize.consume_click());
        assert!(!resize.consume_click());
    }

    #[test]
    fn suppression_clears_on_the_tick_after_pointer_up() {
        let mut resize = controller();
        resize.begin(&entry_b(), ResizeEdge::End, after_a()).unwrap();
        resize.on_tick();
        assert!(resize.suppression().is_armed());

        resize.finish();
        resize.on_tick();
        assert!(!resize.consume_click());
    }
}
