pub mod activity;
pub mod config;
pub mod hover;
pub mod interaction;
pub mod models;
pub mod settings;
pub mod store;
pub mod timeline;
pub mod timer;
pub mod utils;
pub mod view;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};

pub use config::TimelineConfig;
pub use settings::{Preferences, SettingsStore, UserPreferences};
pub use store::{EntryDetails, EntryStore, MemoryStore, NewEntry, ScreenshotLookup, StoreError};
pub use timeline::{Day, IntervalSet, TimeAxisProjection, TimeRange, ZoomState};
pub use timer::{ActiveTimer, TimerController};
pub use view::DayTimeline;

/// Logging setup; `RUST_LOG` overrides the info default. Safe to call more
/// than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Long-lived services shared by every day view.
pub struct AppState<S: EntryStore> {
    pub store: Arc<S>,
    pub settings: Arc<SettingsStore>,
    pub timer: TimerController<S, SettingsStore>,
    pub config: TimelineConfig,
}

impl<S: EntryStore> AppState<S> {
    /// Opens `settings.json` under `data_dir` and resumes a stopwatch that
    /// was still running when the app last exited.
    pub async fn start(store: Arc<S>, data_dir: &Path, config: TimelineConfig) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
        let timer = TimerController::new(store.clone(), settings.clone(), &config);

        match timer.resume().await {
            Ok(Some(active)) => info!("Recovered running timer for entry {}", active.entry_id),
            Ok(None) => {}
            Err(err) => warn!("Could not resume persisted timer: {err:?}"),
        }

        Ok(Self {
            store,
            settings,
            timer,
            config,
        })
    }
}

impl<S: EntryStore + ScreenshotLookup> AppState<S> {
    pub async fn open_day(
        &self,
        day: Day,
        container_width: f64,
    ) -> Result<DayTimeline<S, SettingsStore>> {
        DayTimeline::open(
            self.store.clone(),
            self.settings.clone(),
            self.config.clone(),
            container_width,
            day,
        )
        .await
    }
}

impl<S: EntryStore> Drop for AppState<S> {
    fn drop(&mut self) {
        self.timer.shutdown();
    }
}
