//! Ports to the collaborator that owns persistence.
//!
//! The timeline never writes entries itself; it proposes changes through
//! [`EntryStore`] and re-reads the authoritative state afterwards.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    models::{Category, CategoryId, EntryId, ProcessSample, ScreenshotRef, TimeEntry},
    timeline::{Day, TimeRange},
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("time range overlaps an existing entry")]
    Overlap,
    #[error("entry is shorter than the minimum duration")]
    MinDuration,
    #[error("end time must be after start time")]
    InvalidRange,
    #[error("label cannot be empty")]
    EmptyLabel,
    #[error("entry {0} not found")]
    NotFound(EntryId),
    #[error("entry store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub range: TimeRange,
    pub label: String,
    pub category_id: Option<CategoryId>,
}

/// Edit-dialog changes; `None` leaves a field untouched. `Some(None)` clears
/// the category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetails {
    pub label: Option<String>,
    pub category_id: Option<Option<CategoryId>>,
}

/// Request/response commands against the entry store. Every call ends in a
/// definitive success or error and is safe to retry.
pub trait EntryStore: Send + Sync + 'static {
    fn list_entries(&self, day: Day) -> impl Future<Output = StoreResult<Vec<TimeEntry>>> + Send;

    fn propose_create(&self, entry: NewEntry) -> impl Future<Output = StoreResult<TimeEntry>> + Send;

    fn propose_update_range(
        &self,
        id: EntryId,
        range: TimeRange,
    ) -> impl Future<Output = StoreResult<TimeEntry>> + Send;

    fn update_details(
        &self,
        id: EntryId,
        details: EntryDetails,
    ) -> impl Future<Output = StoreResult<TimeEntry>> + Send;

    fn propose_delete(&self, id: EntryId) -> impl Future<Output = StoreResult<()>> + Send;

    fn list_process_samples(&self, day: Day) -> impl Future<Output = StoreResult<Vec<ProcessSample>>> + Send;

    fn list_screenshot_times(&self, day: Day) -> impl Future<Output = StoreResult<Vec<DateTime<Utc>>>> + Send;

    fn list_categories(&self) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;
}

/// Finds the screenshot nearest to an instant.
pub trait ScreenshotLookup: Send + Sync + 'static {
    fn lookup_screenshot(
        &self,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Option<ScreenshotRef>>> + Send;
}
