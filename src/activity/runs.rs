use chrono::{DateTime, Utc};

use crate::models::{ColorHint, ProcessRun};
use crate::timeline::{gaps_within, TimeRange};

use super::ActivityTimeline;

/// One run per free gap between entries, spanning the whole gap and named
/// after the process with the most seconds inside it. Gaps without any
/// recorded activity produce no run.
pub fn derive_process_runs(
    occupied: &[TimeRange],
    activity: &ActivityTimeline,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<ProcessRun> {
    if activity.is_empty() {
        return Vec::new();
    }

    gaps_within(window_start, window_end, occupied)
        .into_iter()
        .filter_map(|gap| {
            let usage = activity.aggregate_usage(gap.start, gap.end);
            let process_name = usage.dominant()?;
            Some(ProcessRun {
                start: gap.start,
                end: gap.end,
                process_name: process_name.to_string(),
                color: ColorHint::from_name(process_name),
            })
        })
        .collect()
}
