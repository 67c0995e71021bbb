//! Pointer handling for the axis: an explicit `Idle | Dragging | Resizing`
//! machine that turns raw pointer events into timeline intents.

pub mod drag;
pub mod resize;

pub use drag::{DragSelection, DragSelectionController};
pub use resize::{
    ClickSuppression, ResizeBoundaries, ResizeController, ResizeEdge, ResizeRefused,
    ResizeSession,
};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use serde::Serialize;

use crate::{
    hover::Point,
    models::EntryId,
    timeline::{
        layout::{block_hit, lane_at, EntryBlock, EntryHit, Lane},
        IntervalSet, TimeAxisProjection, TimeRange,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
    Click,
}

/// `x`/`y` are in axis content coordinates (scroll already applied);
/// `client` is the viewport position used to place the hover card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    pub client: Point,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64, client: Point) -> Self {
        Self { kind, x, y, client }
    }
}

/// What the axis asks its owner to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TimelineIntent {
    ProposeCreate { range: TimeRange },
    ProposeUpdateRange { entry_id: EntryId, range: TimeRange },
    Hover { at: DateTime<Utc>, client: Point },
    ProcessBarHover { at: DateTime<Utc>, client: Point },
    ProcessBarClick { at: DateTime<Utc> },
    HoverEnd,
    ProcessBarLeave,
    EntryClicked { entry_id: EntryId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging(DragSelection),
    Resizing(ResizeSession),
}

#[derive(Debug)]
pub struct TimelineInteraction {
    drag: DragSelectionController,
    resize: ResizeController,
}

impl TimelineInteraction {
    pub fn new(min_duration: TimeDelta) -> Self {
        Self {
            drag: DragSelectionController::new(min_duration),
            resize: ResizeController::new(min_duration),
        }
    }

    pub fn state(&self) -> InteractionState {
        if let Some(session) = self.resize.session() {
            InteractionState::Resizing(session.clone())
        } else if let Some(selection) = self.drag.selection() {
            InteractionState::Dragging(selection)
        } else {
            InteractionState::Idle
        }
    }

    pub fn drag_preview(&self) -> Option<TimeRange> {
        self.drag.preview()
    }

    pub fn resize_preview(&self) -> Option<(EntryId, TimeRange)> {
        self.resize.preview()
    }

    /// Called once per frame after pointer-up so the trailing click of a
    /// resize can still be swallowed.
    pub fn tick(&mut self) {
        self.resize.on_tick();
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        projection: &TimeAxisProjection,
        intervals: &IntervalSet,
        blocks: &[EntryBlock],
    ) -> Vec<TimelineIntent> {
        let at = projection.x_to_time(event.x);
        match event.kind {
            PointerKind::Down => self.pointer_down(event, at, intervals, blocks),
            PointerKind::Move => self.pointer_move(event, at),
            PointerKind::Up => self.pointer_up(),
            PointerKind::Leave => {
                let mut intents = self.pointer_leave();
                intents.push(TimelineIntent::HoverEnd);
                intents.push(TimelineIntent::ProcessBarLeave);
                intents
            }
            PointerKind::Click => self.click(event, at, blocks),
        }
    }

    fn pointer_down(
        &mut self,
        event: PointerEvent,
        at: DateTime<Utc>,
        intervals: &IntervalSet,
        blocks: &[EntryBlock],
    ) -> Vec<TimelineIntent> {
        if self.resize.is_active() || lane_at(event.y) != Lane::Entries {
            return Vec::new();
        }

        match block_hit(blocks, event.x, event.y) {
            Some((entry_id, EntryHit::Handle(edge))) => {
                let Some(entry) = intervals.get(entry_id) else {
                    debug!("{}", ResizeRefused::UnknownEntry(entry_id));
                    return Vec::new();
                };
                let Some(neighbors) = intervals.neighbor_bounds_of(entry_id) else {
                    return Vec::new();
                };
                self.drag.cancel();
                match self.resize.begin(entry, edge, neighbors) {
                    Ok(()) => vec![TimelineIntent::HoverEnd],
                    Err(refused) => {
                        debug!("resize not started: {refused}");
                        Vec::new()
                    }
                }
            }
            Some((_, EntryHit::Body)) => Vec::new(),
            None => {
                self.drag.begin(at);
                Vec::new()
            }
        }
    }

    fn pointer_move(&mut self, event: PointerEvent, at: DateTime<Utc>) -> Vec<TimelineIntent> {
        if self.resize.update(at).is_some() || self.drag.update(at).is_some() {
            return Vec::new();
        }

        match lane_at(event.y) {
            Lane::Process => vec![TimelineIntent::ProcessBarHover {
                at,
                client: event.client,
            }],
            Lane::Entries | Lane::Header => vec![TimelineIntent::Hover {
                at,
                client: event.client,
            }],
        }
    }

    fn pointer_up(&mut self) -> Vec<TimelineIntent> {
        if self.resize.is_active() {
            return self
                .resize
                .finish()
                .map(|(entry_id, range)| TimelineIntent::ProposeUpdateRange { entry_id, range })
                .into_iter()
                .collect();
        }

        self.drag
            .finish()
            .map(|range| TimelineIntent::ProposeCreate { range })
            .into_iter()
            .collect()
    }

    /// Leaving the axis abandons a drag but commits a resize in progress.
    fn pointer_leave(&mut self) -> Vec<TimelineIntent> {
        self.drag.cancel();
        if self.resize.is_active() {
            self.pointer_up()
        } else {
            Vec::new()
        }
    }

    fn click(
        &mut self,
        event: PointerEvent,
        at: DateTime<Utc>,
        blocks: &[EntryBlock],
    ) -> Vec<TimelineIntent> {
        if self.resize.consume_click() {
            return Vec::new();
        }

        match lane_at(event.y) {
            Lane::Process => vec![TimelineIntent::ProcessBarClick { at }],
            Lane::Entries => block_hit(blocks, event.x, event.y)
                .map(|(entry_id, _)| TimelineIntent::EntryClicked { entry_id })
                .into_iter()
                .collect(),
            Lane::Header => Vec::new(),
        }
    }
}
