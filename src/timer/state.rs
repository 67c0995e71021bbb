use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CategoryId, EntryId};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

/// The running stopwatch and the entry it grows. Persisted so a restart can
/// resume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub session_id: Uuid,
    pub entry_id: EntryId,
    pub started_at: DateTime<Utc>,
    pub label: String,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub active: Option<ActiveTimer>,
    /// End time most recently accepted by the store.
    pub last_end: Option<DateTime<Utc>>,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.session_id)
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        match &self.active {
            Some(active) if self.is_running() => (now - active.started_at).max(TimeDelta::zero()),
            _ => TimeDelta::zero(),
        }
    }

    pub fn begin_session(&mut self, active: ActiveTimer, end: DateTime<Utc>) {
        *self = Self {
            status: TimerStatus::Running,
            active: Some(active),
            last_end: Some(end),
        };
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

/// `HH:MM:SS`; hours keep counting past 99.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
