use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::day::DAY_MS;

pub const HOURS_IN_DAY: u8 = 24;
pub const MIN_VISIBLE_HOURS: u8 = 4;
pub const MAX_VISIBLE_HOURS: u8 = 24;

/// Axis width used before the container has been measured.
pub const FALLBACK_AXIS_WIDTH: f64 = 1200.0;

/// How many hours of the day fit in the visible container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomState {
    visible_hours: u8,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            visible_hours: MAX_VISIBLE_HOURS,
        }
    }
}

impl ZoomState {
    pub fn new(visible_hours: i64) -> Self {
        let clamped = visible_hours.clamp(MIN_VISIBLE_HOURS as i64, MAX_VISIBLE_HOURS as i64);
        Self {
            visible_hours: clamped as u8,
        }
    }

    pub fn visible_hours(&self) -> u8 {
        self.visible_hours
    }

    /// One wheel notch: positive widens the visible window, negative narrows it.
    pub fn stepped(&self, direction: i8) -> Self {
        Self::new(self.visible_hours as i64 + direction.signum() as i64)
    }
}

/// Bidirectional timestamp/pixel mapping for one day at one axis width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxisProjection {
    day_start: DateTime<Utc>,
    axis_width: f64,
}

impl TimeAxisProjection {
    pub fn new(day_start: DateTime<Utc>, container_width: f64, zoom: ZoomState) -> Self {
        Self {
            day_start,
            axis_width: Self::axis_width_for(container_width, zoom),
        }
    }

    pub fn with_axis_width(day_start: DateTime<Utc>, axis_width: f64) -> Self {
        let axis_width = if axis_width > 0.0 && axis_width.is_finite() {
            axis_width
        } else {
            FALLBACK_AXIS_WIDTH
        };
        Self {
            day_start,
            axis_width,
        }
    }

    /// `containerWidth * 24 / visibleHours`
    pub fn axis_width_for(container_width: f64, zoom: ZoomState) -> f64 {
        if container_width <= 0.0 || !container_width.is_finite() {
            return FALLBACK_AXIS_WIDTH;
        }
        container_width * HOURS_IN_DAY as f64 / zoom.visible_hours() as f64
    }

    pub fn day_start(&self) -> DateTime<Utc> {
        self.day_start
    }

    pub fn day_end(&self) -> DateTime<Utc> {
        self.day_start + TimeDelta::milliseconds(DAY_MS)
    }

    pub fn axis_width(&self) -> f64 {
        self.axis_width
    }

    pub fn ms_per_pixel(&self) -> f64 {
        DAY_MS as f64 / self.axis_width
    }

    pub fn time_to_x(&self, timestamp: DateTime<Utc>) -> f64 {
        let offset_ms = (timestamp - self.day_start).num_milliseconds() as f64;
        offset_ms / DAY_MS as f64 * self.axis_width
    }

    /// Clamps `x` into the axis first, so the result always lies within the day.
    pub fn x_to_time(&self, x: f64) -> DateTime<Utc> {
        let x = if x.is_nan() { 0.0 } else { x };
        let clamped = x.clamp(0.0, self.axis_width);
        let offset_ms = (clamped / self.axis_width * DAY_MS as f64).round() as i64;
        self.day_start + TimeDelta::milliseconds(offset_ms)
    }

    /// Pixel offsets of the hour gridlines, `0:00` through `24:00`.
    pub fn hour_ticks(&self) -> Vec<(u8, f64)> {
        (0..=HOURS_IN_DAY)
            .map(|hour| {
                let x = hour as f64 / HOURS_IN_DAY as f64 * self.axis_width;
                (hour, x)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
    }

    #[test]
    fn zoom_is_clamped_to_supported_hours() {
        assert_eq!(ZoomState::new(1).visible_hours(), MIN_VISIBLE_HOURS);
        assert_eq!(ZoomState::new(40).visible_hours(), MAX_VISIBLE_HOURS);
        assert_eq!(ZoomState::new(24).stepped(1).visible_hours(), 24);
        assert_eq!(ZoomState::new(8).stepped(-1).visible_hours(), 7);
    }

    #[test]
    fn axis_width_scales_with_visible_hours() {
        let projection = TimeAxisProjection::new(day_start(), 1000.0, ZoomState::new(6));
        assert_eq!(projection.axis_width(), 4000.0);

        let unmeasured = TimeAxisProjection::new(day_start(), 0.0, ZoomState::new(6));
        assert_eq!(unmeasured.axis_width(), FALLBACK_AXIS_WIDTH);
    }

    #[test]
    fn noon_sits_in_the_middle_of_the_axis() {
        let projection = TimeAxisProjection::with_axis_width(day_start(), 2400.0);
        let noon = day_start() + TimeDelta::hours(12);
        assert_eq!(projection.time_to_x(noon), 1200.0);
        assert_eq!(projection.x_to_time(1200.0), noon);
    }

    #[test]
    fn x_to_time_clamps_outside_the_axis() {
        let projection = TimeAxisProjection::with_axis_width(day_start(), 2400.0);
        assert_eq!(projection.x_to_time(-50.0), projection.day_start());
        assert_eq!(projection.x_to_time(9_999.0), projection.day_end());
    }

    #[test]
    fn round_trip_error_is_bounded_by_one_pixel_of_time() {
        let projection = TimeAxisProjection::with_axis_width(day_start(), 1337.0);
        let bound_ms = projection.ms_per_pixel();
        for minute in (0..24 * 60).step_by(7) {
            let t = day_start() + TimeDelta::minutes(minute) + TimeDelta::milliseconds(431);
            let back = projection.x_to_time(projection.time_to_x(t));
            let error_ms = (back - t).num_milliseconds().abs() as f64;
            assert!(error_ms <= bound_ms, "minute={minute} error={error_ms}");
        }
    }

    #[test]
    fn hour_ticks_cover_the_whole_day() {
        let projection = TimeAxisProjection::with_axis_width(day_start(), 2400.0);
        let ticks = projection.hour_ticks();
        assert_eq!(ticks.len(), 25);
        assert_eq!(ticks[0], (0, 0.0));
        assert_eq!(ticks[24], (24, 2400.0));
    }
}
