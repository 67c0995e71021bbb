use std::time::Duration;

use chrono::TimeDelta;
use log::warn;

use crate::{
    activity::DEFAULT_LAST_SAMPLE_TAIL_MS,
    hover::{
        coordinator::{DEFAULT_HOVER_DEBOUNCE_MS, DEFAULT_HOVER_FADE_OUT_MS},
        HoverCardPositioner,
    },
};

/// Tunables for the day view, the stopwatch and the hover card.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Shortest entry a drag or resize may produce
    pub min_entry_duration: TimeDelta,

    pub hover_debounce: Duration,
    pub hover_fade_out: Duration,

    /// How often a running stopwatch pushes its entry's end forward
    pub timer_growth_interval: Duration,
    /// Length of the entry a freshly started stopwatch creates
    pub timer_placeholder: TimeDelta,

    /// Refresh cadence for process samples and screenshots while viewing today
    pub poll_interval: Duration,

    /// Time credited to the last process sample of a range
    pub last_sample_tail: TimeDelta,
    pub top_process_limit: usize,

    pub card_margin: f64,
    pub card_offset: f64,
    pub card_gap: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_entry_duration: TimeDelta::seconds(60),
            hover_debounce: Duration::from_millis(DEFAULT_HOVER_DEBOUNCE_MS),
            hover_fade_out: Duration::from_millis(DEFAULT_HOVER_FADE_OUT_MS),
            timer_growth_interval: Duration::from_secs(3),
            timer_placeholder: TimeDelta::seconds(1),
            poll_interval: Duration::from_secs(10),
            last_sample_tail: TimeDelta::milliseconds(DEFAULT_LAST_SAMPLE_TAIL_MS),
            top_process_limit: 3,
            card_margin: 8.0,
            card_offset: 16.0,
            card_gap: 8.0,
        }
    }
}

impl TimelineConfig {
    /// Defaults overridden by `DAYLOG_POLL_INTERVAL_SECS` and `DAYLOG_DEBUG`.
    /// Debug mode polls every second.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DAYLOG_DEBUG").ok().as_deref(),
            std::env::var("DAYLOG_POLL_INTERVAL_SECS").ok().as_deref(),
        )
    }

    fn from_vars(debug: Option<&str>, poll_secs: Option<&str>) -> Self {
        let mut config = Self::default();

        let debug_mode = debug
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config.poll_interval = Duration::from_secs(1);
        }

        if let Some(raw) = poll_secs {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.poll_interval = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid DAYLOG_POLL_INTERVAL_SECS value {raw:?}"),
            }
        }

        config
    }

    pub fn positioner(&self) -> HoverCardPositioner {
        HoverCardPositioner::new(self.card_margin, self.card_offset, self.card_gap)
    }
}
