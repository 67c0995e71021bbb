use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::TimeRange;

/// Point-in-time sample of the foreground process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSample {
    pub timestamp: DateTime<Utc>,
    pub process_name: String,
}

impl ProcessSample {
    pub fn new(timestamp: DateTime<Utc>, process_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            process_name: process_name.into(),
        }
    }
}

/// A gap between time entries summarised by its dominant process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRun {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub process_name: String,
    pub color: ColorHint,
}

impl ProcessRun {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// Stable colour derived from a process name, so a process keeps its colour
/// across days and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorHint {
    pub hue: u16,
}

impl ColorHint {
    const SATURATION: u8 = 62;
    const LIGHTNESS: u8 = 52;

    pub fn from_name(name: &str) -> Self {
        // FNV-1a over the lowercased name.
        let mut hash: u32 = 0x811c_9dc5;
        for byte in name.to_lowercase().bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        Self {
            hue: (hash % 360) as u16,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "hsl({}, {}%, {}%)",
            self.hue,
            Self::SATURATION,
            Self::LIGHTNESS
        )
    }
}

/// Where the screenshot nearest to a moment can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRef {
    pub timestamp: DateTime<Utc>,
    pub file_path: Option<String>,
    pub data_url: Option<String>,
}

impl ScreenshotRef {
    pub fn has_image(&self) -> bool {
        self.file_path.is_some() || self.data_url.is_some()
    }
}
