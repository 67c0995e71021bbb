use chrono::{DateTime, TimeDelta, Utc};

use crate::timeline::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSelection {
    pub anchor: DateTime<Utc>,
    pub current: DateTime<Utc>,
}

impl DragSelection {
    pub fn preview(&self) -> TimeRange {
        TimeRange::ordered(self.anchor, self.current)
    }
}

/// Creates a new interval by dragging across free space on the entry lane.
/// The preview never touches the interval set.
#[derive(Debug)]
pub struct DragSelectionController {
    min_duration: TimeDelta,
    selection: Option<DragSelection>,
}

impl DragSelectionController {
    pub fn new(min_duration: TimeDelta) -> Self {
        Self {
            min_duration,
            selection: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<DragSelection> {
        self.selection
    }

    pub fn preview(&self) -> Option<TimeRange> {
        self.selection.map(|selection| selection.preview())
    }

    pub fn begin(&mut self, at: DateTime<Utc>) {
        self.selection = Some(DragSelection {
            anchor: at,
            current: at,
        });
    }

    pub fn update(&mut self, at: DateTime<Utc>) -> Option<TimeRange> {
        let selection = self.selection.as_mut()?;
        selection.current = at;
        Some(selection.preview())
    }

    /// The selected range when it is strictly longer than the minimum
    /// duration; shorter drags are dropped silently.
    pub fn finish(&mut self) -> Option<TimeRange> {
        let range = self.selection.take()?.preview();
        (range.duration() > self.min_duration).then_some(range)
    }

    pub fn cancel(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
    }

    fn controller() -> DragSelectionController {
        DragSelectionController::new(TimeDelta::minutes(1))
    }

    #[test]
    fn backwards_drag_yields_an_ordered_range() {
        let mut drag = controller();
        drag.begin(at(11, 0, 0));
        assert_eq!(
            drag.update(at(10, 15, 0)),
            Some(TimeRange::new(at(10, 15, 0), at(11, 0, 0)))
        );
        assert_eq!(drag.finish(), Some(TimeRange::new(at(10, 15, 0), at(11, 0, 0))));
        assert!(!drag.is_active());
    }

    #[test]
    fn exactly_one_minute_is_not_enough() {
        let mut drag = controller();
        drag.begin(at(9, 0, 0));
        drag.update(at(9, 1, 0));
        assert_eq!(drag.finish(), None);

        drag.begin(at(9, 0, 0));
        drag.update(at(9, 1, 1));
        assert!(drag.finish().is_some());
    }

    #[test]
    fn cancel_discards_the_selection() {
        let mut drag = controller();
        drag.begin(at(9, 0, 0));
        drag.update(at(9, 30, 0));
        drag.cancel();
        assert_eq!(drag.finish(), None);
        assert_eq!(drag.update(at(9, 45, 0)), None);
    }
}
