pub mod activity;
pub mod entry;

pub use activity::{ColorHint, ProcessRun, ProcessSample, ScreenshotRef};
pub use entry::{Category, CategoryId, EntryId, TimeEntry, UNCATEGORIZED_COLOR};
