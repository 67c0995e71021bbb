use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    interaction::ResizeEdge,
    models::{Category, CategoryId, EntryId, ProcessRun, UNCATEGORIZED_COLOR},
};

use super::{IntervalSet, TimeAxisProjection, TimeRange};

pub const ENTRY_BAR_Y: f64 = 20.0;
pub const ENTRY_BAR_HEIGHT: f64 = 60.0;
pub const SCREENSHOT_MARKER_Y: f64 = 88.0;
pub const PROCESS_BAR_Y: f64 = 102.0;
pub const PROCESS_BAR_HEIGHT: f64 = 10.0;
pub const AXIS_HEIGHT: f64 = 120.0;

const HANDLE_INSET: f64 = 2.0;
const LABEL_PADDING: f64 = 6.0;
const LABEL_MIN_BLOCK_WIDTH: f64 = 36.0;
const LABEL_MAX_LINES: usize = 3;
const LABEL_UNIT_WIDTH: f64 = 7.0;

/// Horizontal band of the axis a pointer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Header,
    Entries,
    Process,
}

pub fn lane_at(y: f64) -> Lane {
    if y >= PROCESS_BAR_Y {
        Lane::Process
    } else if y >= ENTRY_BAR_Y {
        Lane::Entries
    } else {
        Lane::Header
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryHit {
    Body,
    Handle(ResizeEdge),
}

/// Rendered geometry of one time entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBlock {
    pub entry_id: EntryId,
    pub x: f64,
    pub width: f64,
    pub handle_width: f64,
    pub color: String,
    pub label_lines: Vec<String>,
    pub resizing: bool,
}

impl EntryBlock {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Handles win over the body; the end handle wins when both overlap on
    /// a narrow block.
    pub fn hit(&self, x: f64, y: f64) -> Option<EntryHit> {
        if x < self.x || x >= self.right() || y < ENTRY_BAR_Y || y >= ENTRY_BAR_Y + ENTRY_BAR_HEIGHT {
            return None;
        }

        let handle_top = ENTRY_BAR_Y + HANDLE_INSET;
        let handle_bottom = ENTRY_BAR_Y + ENTRY_BAR_HEIGHT - HANDLE_INSET;
        if y >= handle_top && y < handle_bottom {
            if x >= self.right() - self.handle_width {
                return Some(EntryHit::Handle(ResizeEdge::End));
            }
            if x < self.x + self.handle_width {
                return Some(EntryHit::Handle(ResizeEdge::Start));
            }
        }
        Some(EntryHit::Body)
    }
}

pub fn handle_width(block_width: f64) -> f64 {
    (block_width / 2.0).max(6.0).min(10.0)
}

/// Lays out every entry of the set; `preview` replaces one entry's bounds
/// while it is being resized.
pub fn entry_blocks(
    projection: &TimeAxisProjection,
    intervals: &IntervalSet,
    categories: &[Category],
    preview: Option<(EntryId, TimeRange)>,
) -> Vec<EntryBlock> {
    let colors: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.color.as_str()))
        .collect();

    intervals
        .entries()
        .iter()
        .map(|entry| {
            let previewed = preview.filter(|(id, _)| *id == entry.id);
            let range = previewed.map(|(_, range)| range).unwrap_or_else(|| entry.range());

            let x = projection.time_to_x(range.start);
            let width = (projection.time_to_x(range.end) - x).max(1.0);
            let color = entry
                .category_id
                .and_then(|id| colors.get(&id).copied())
                .unwrap_or(UNCATEGORIZED_COLOR)
                .to_string();
            let label_lines = if width >= LABEL_MIN_BLOCK_WIDTH {
                wrap_label_lines(&entry.label, width - 2.0 * LABEL_PADDING, LABEL_MAX_LINES)
            } else {
                Vec::new()
            };

            EntryBlock {
                entry_id: entry.id,
                x,
                width,
                handle_width: handle_width(width),
                color,
                label_lines,
                resizing: previewed.is_some(),
            }
        })
        .collect()
}

/// First block under the pointer, checked topmost (last drawn) first.
pub fn block_hit(blocks: &[EntryBlock], x: f64, y: f64) -> Option<(EntryId, EntryHit)> {
    blocks
        .iter()
        .rev()
        .find_map(|block| block.hit(x, y).map(|hit| (block.entry_id, hit)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBlock {
    pub x: f64,
    pub width: f64,
    pub process_name: String,
    pub color: String,
}

pub fn process_blocks(projection: &TimeAxisProjection, runs: &[ProcessRun]) -> Vec<ProcessBlock> {
    let day = TimeRange::new(projection.day_start(), projection.day_end());

    runs.iter()
        .filter_map(|run| {
            let clipped = run.range().clip(&day)?;
            let x = projection.time_to_x(clipped.start);
            let width = (projection.time_to_x(clipped.end) - x).max(1.0);
            Some(ProcessBlock {
                x,
                width,
                process_name: run.process_name.clone(),
                color: run.color.css(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenshotMarker {
    pub timestamp: DateTime<Utc>,
    pub x: f64,
}

pub fn screenshot_markers(
    projection: &TimeAxisProjection,
    timestamps: &[DateTime<Utc>],
) -> Vec<ScreenshotMarker> {
    let day = TimeRange::new(projection.day_start(), projection.day_end());
    timestamps
        .iter()
        .filter(|timestamp| day.contains(**timestamp))
        .map(|&timestamp| ScreenshotMarker {
            timestamp,
            x: projection.time_to_x(timestamp),
        })
        .collect()
}

fn char_units(c: char) -> usize {
    if (c as u32) <= 0xff {
        1
    } else {
        2
    }
}

/// Greedy character wrap at 7 px per unit. Latin-1 characters take one unit,
/// everything else two. Text that does not fit ends the last line with `...`.
pub fn wrap_label_lines(label: &str, max_width: f64, max_lines: usize) -> Vec<String> {
    let label = label.trim();
    if label.is_empty() || max_width <= 0.0 || max_lines == 0 {
        return Vec::new();
    }

    let max_units = ((max_width / LABEL_UNIT_WIDTH).floor() as usize).max(1);
    let chars: Vec<char> = label.chars().collect();

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_units = 0;
    let mut consumed = 0;

    for (i, &c) in chars.iter().enumerate() {
        let units = char_units(c);
        if current_units + units > max_units && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            if lines.len() >= max_lines {
                break;
            }
            current.push(c);
            current_units = units;
        } else {
            current.push(c);
            current_units += units;
        }
        consumed = i + 1;
    }

    if lines.len() < max_lines && !current.is_empty() {
        lines.push(current);
    }

    if consumed < chars.len() {
        if let Some(last) = lines.last_mut() {
            if last.chars().count() > 1 {
                last.pop();
            }
            last.push_str("...");
        }
    }

    lines
}
