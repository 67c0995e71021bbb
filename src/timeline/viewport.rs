use chrono::{DateTime, Utc};

use super::projection::{TimeAxisProjection, ZoomState};

/// A wheel gesture over the axis viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Ctrl or Cmd held.
    pub modified: bool,
    /// Pointer position relative to the left edge of the viewport.
    pub pointer_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelOutcome {
    Zoomed(ZoomState),
    Panned { scroll_offset: f64 },
    Ignored,
}

/// The scrollable window onto the axis: container width, zoom and scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisViewport {
    container_width: f64,
    scroll_offset: f64,
    zoom: ZoomState,
}

impl AxisViewport {
    pub fn new(container_width: f64, zoom: ZoomState) -> Self {
        Self {
            container_width: container_width.max(0.0),
            scroll_offset: 0.0,
            zoom,
        }
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn axis_width(&self) -> f64 {
        TimeAxisProjection::axis_width_for(self.container_width, self.zoom)
    }

    pub fn max_scroll(&self) -> f64 {
        (self.axis_width() - self.container_width).max(0.0)
    }

    pub fn projection(&self, day_start: DateTime<Utc>) -> TimeAxisProjection {
        TimeAxisProjection::new(day_start, self.container_width, self.zoom)
    }

    /// Container was re-measured; keep the scroll offset inside the new bounds.
    pub fn resize(&mut self, container_width: f64) {
        self.container_width = container_width.max(0.0);
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll());
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll_offset = offset.clamp(0.0, self.max_scroll());
    }

    pub fn pan(&mut self, delta: f64) {
        self.scroll_to(self.scroll_offset + delta);
    }

    /// Change the zoom while keeping the instant under `anchor_offset` in place.
    /// Returns `false` when the zoom level did not change.
    pub fn zoom_anchored(&mut self, zoom: ZoomState, anchor_offset: f64) -> bool {
        if zoom == self.zoom {
            return false;
        }

        let old_width = self.axis_width();
        let anchor_offset = anchor_offset.clamp(0.0, self.container_width);
        let ratio = if old_width > 0.0 {
            (self.scroll_offset + anchor_offset) / old_width
        } else {
            0.0
        };

        self.zoom = zoom;
        let new_width = self.axis_width();
        self.scroll_offset = (ratio * new_width - anchor_offset).clamp(0.0, self.max_scroll());
        true
    }

    /// Slider path: absolute zoom anchored at the viewport centre.
    pub fn zoom_centered(&mut self, zoom: ZoomState) -> bool {
        self.zoom_anchored(zoom, self.container_width / 2.0)
    }

    pub fn wheel(&mut self, input: WheelInput) -> WheelOutcome {
        if input.modified {
            if input.delta_y == 0.0 {
                return WheelOutcome::Ignored;
            }
            let direction = if input.delta_y > 0.0 { 1 } else { -1 };
            let next = self.zoom.stepped(direction);
            if self.zoom_anchored(next, input.pointer_offset) {
                return WheelOutcome::Zoomed(next);
            }
            return WheelOutcome::Ignored;
        }

        if input.delta_y.abs() > input.delta_x.abs() {
            self.pan(input.delta_y);
            return WheelOutcome::Panned {
                scroll_offset: self.scroll_offset,
            };
        }

        WheelOutcome::Ignored
    }
}
