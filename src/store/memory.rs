use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::{
    models::{Category, CategoryId, EntryId, ProcessSample, ScreenshotRef, TimeEntry},
    timeline::{Day, TimeRange},
};

use super::{EntryDetails, EntryStore, NewEntry, ScreenshotLookup, StoreError, StoreResult};

const DEFAULT_SCREENSHOT_TOLERANCE_MINUTES: i64 = 5;

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<TimeEntry>,
    categories: Vec<Category>,
    samples: Vec<ProcessSample>,
    screenshots: Vec<ScreenshotRef>,
    next_entry_id: i64,
    next_category_id: i64,
}

impl StoreState {
    fn overlaps(&self, range: &TimeRange, excluding: Option<EntryId>) -> bool {
        self.entries
            .iter()
            .filter(|entry| Some(entry.id) != excluding)
            .any(|entry| entry.range().overlaps(range))
    }

    fn entry_mut(&mut self, id: EntryId) -> StoreResult<&mut TimeEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

/// Entry store kept entirely in memory, with the same validation rules as
/// the persistent store. Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    offline: Arc<AtomicBool>,
    min_duration: Option<TimeDelta>,
    screenshot_tolerance: TimeDelta,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                next_entry_id: 1,
                next_category_id: 1,
                ..StoreState::default()
            })),
            offline: Arc::new(AtomicBool::new(false)),
            min_duration: None,
            screenshot_tolerance: TimeDelta::minutes(DEFAULT_SCREENSHOT_TOLERANCE_MINUTES),
        }
    }

    /// Reject creates and range updates shorter than `min_duration`.
    pub fn with_min_duration(mut self, min_duration: TimeDelta) -> Self {
        self.min_duration = Some(min_duration);
        self
    }

    pub fn with_screenshot_tolerance(mut self, tolerance: TimeDelta) -> Self {
        self.screenshot_tolerance = tolerance;
        self
    }

    /// While offline every command fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".into()))
        } else {
            Ok(())
        }
    }

    fn validate_range(&self, range: &TimeRange) -> StoreResult<()> {
        if range.end <= range.start {
            return Err(StoreError::InvalidRange);
        }
        if let Some(min) = self.min_duration {
            if range.duration() < min {
                return Err(StoreError::MinDuration);
            }
        }
        Ok(())
    }

    pub async fn add_category(&self, name: &str, color: &str) -> Category {
        let mut state = self.state.lock().await;
        let category = Category {
            id: CategoryId(state.next_category_id),
            name: name.to_string(),
            color: color.to_string(),
        };
        state.next_category_id += 1;
        state.categories.push(category.clone());
        category
    }

    pub async fn record_process_sample(&self, timestamp: DateTime<Utc>, process_name: &str) {
        let mut state = self.state.lock().await;
        state.samples.push(ProcessSample::new(timestamp, process_name));
        state.samples.sort_by_key(|sample| sample.timestamp);
    }

    pub async fn record_screenshot(&self, timestamp: DateTime<Utc>, file_path: &str) {
        let mut state = self.state.lock().await;
        state.screenshots.push(ScreenshotRef {
            timestamp,
            file_path: Some(file_path.to_string()),
            data_url: None,
        });
        state.screenshots.sort_by_key(|shot| shot.timestamp);
    }

    pub async fn entry(&self, id: EntryId) -> Option<TimeEntry> {
        let state = self.state.lock().await;
        state.entries.iter().find(|entry| entry.id == id).cloned()
    }

    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

impl EntryStore for MemoryStore {
    async fn list_entries(&self, day: Day) -> StoreResult<Vec<TimeEntry>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut entries: Vec<TimeEntry> = state
            .entries
            .iter()
            .filter(|entry| day.contains(entry.start))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.start, entry.id));
        Ok(entries)
    }

    async fn propose_create(&self, entry: NewEntry) -> StoreResult<TimeEntry> {
        self.ensure_online()?;
        self.validate_range(&entry.range)?;
        let label = entry.label.trim();
        if label.is_empty() {
            return Err(StoreError::EmptyLabel);
        }

        let mut state = self.state.lock().await;
        if state.overlaps(&entry.range, None) {
            return Err(StoreError::Overlap);
        }

        let created = TimeEntry {
            id: EntryId(state.next_entry_id),
            start: entry.range.start,
            end: entry.range.end,
            label: label.to_string(),
            category_id: entry.category_id,
        };
        state.next_entry_id += 1;
        state.entries.push(created.clone());
        Ok(created)
    }

    async fn propose_update_range(&self, id: EntryId, range: TimeRange) -> StoreResult<TimeEntry> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        // NotFound takes precedence over range validation.
        if !state.entries.iter().any(|entry| entry.id == id) {
            return Err(StoreError::NotFound(id));
        }
        self.validate_range(&range)?;
        if state.overlaps(&range, Some(id)) {
            return Err(StoreError::Overlap);
        }

        let entry = state.entry_mut(id)?;
        entry.start = range.start;
        entry.end = range.end;
        Ok(entry.clone())
    }

    async fn update_details(&self, id: EntryId, details: EntryDetails) -> StoreResult<TimeEntry> {
        self.ensure_online()?;
        let label = match details.label.as_deref().map(str::trim) {
            Some("") => return Err(StoreError::EmptyLabel),
            other => other.map(str::to_string),
        };

        let mut state = self.state.lock().await;
        let entry = state.entry_mut(id)?;
        if let Some(label) = label {
            entry.label = label;
        }
        if let Some(category_id) = details.category_id {
            entry.category_id = category_id;
        }
        Ok(entry.clone())
    }

    async fn propose_delete(&self, id: EntryId) -> StoreResult<()> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|entry| entry.id != id);
        if state.entries.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_process_samples(&self, day: Day) -> StoreResult<Vec<ProcessSample>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .samples
            .iter()
            .filter(|sample| day.contains(sample.timestamp))
            .cloned()
            .collect())
    }

    async fn list_screenshot_times(&self, day: Day) -> StoreResult<Vec<DateTime<Utc>>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .screenshots
            .iter()
            .map(|shot| shot.timestamp)
            .filter(|timestamp| day.contains(*timestamp))
            .collect())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.ensure_online()?;
        Ok(self.state.lock().await.categories.clone())
    }
}

impl ScreenshotLookup for MemoryStore {
    async fn lookup_screenshot(&self, at: DateTime<Utc>) -> StoreResult<Option<ScreenshotRef>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .screenshots
            .iter()
            .map(|shot| (shot, (shot.timestamp - at).abs()))
            .filter(|(_, distance)| *distance <= self.screenshot_tolerance)
            // min_by_key keeps the earliest shot on equal distance.
            .min_by_key(|(_, distance)| *distance)
            .map(|(shot, _)| shot.clone()))
    }
}
