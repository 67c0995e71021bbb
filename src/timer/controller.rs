use std::{cmp, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::{
    config::TimelineConfig,
    models::{CategoryId, TimeEntry},
    settings::Preferences,
    store::{EntryStore, NewEntry, StoreError},
    timeline::TimeRange,
};

use super::{format_elapsed, ActiveTimer, TimerState};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Source of wall-clock time for the stopwatch.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed: String,
}

/// Live stopwatch: a running entry created with a placeholder duration whose
/// end is pushed forward on every growth tick until stopped.
///
/// Growth halts on `shutdown()` or once the last handle is dropped. The
/// persisted session survives either way and can be resumed.
pub struct TimerController<S: EntryStore, P: Preferences> {
    state: Arc<Mutex<TimerState>>,
    store: Arc<S>,
    preferences: Arc<P>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    growth_interval: Duration,
    placeholder: TimeDelta,
    clock: Clock,
    state_tx: Arc<watch::Sender<TimerState>>,
    cancel_token: CancellationToken,
    // Shared by user handles only; the ticker's copy leaves it out.
    lifetime: Option<Arc<DropGuard>>,
}

impl<S: EntryStore, P: Preferences> Clone for TimerController<S, P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            store: self.store.clone(),
            preferences: self.preferences.clone(),
            ticker: self.ticker.clone(),
            growth_interval: self.growth_interval,
            placeholder: self.placeholder,
            clock: self.clock.clone(),
            state_tx: self.state_tx.clone(),
            cancel_token: self.cancel_token.clone(),
            lifetime: self.lifetime.clone(),
        }
    }
}

impl<S: EntryStore, P: Preferences> TimerController<S, P> {
    pub fn new(store: Arc<S>, preferences: Arc<P>, config: &TimelineConfig) -> Self {
        let (state_tx, _) = watch::channel(TimerState::new());
        let cancel_token = CancellationToken::new();
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            store,
            preferences,
            ticker: Arc::new(Mutex::new(None)),
            growth_interval: config.timer_growth_interval,
            placeholder: config.timer_placeholder,
            clock: system_clock(),
            state_tx: Arc::new(state_tx),
            lifetime: Some(Arc::new(cancel_token.clone().drop_guard())),
            cancel_token,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Stops growth for good. The running session stays persisted.
    pub fn shutdown(&self) {
        if !self.cancel_token.is_cancelled() {
            log_info!("timer controller shutting down");
            self.cancel_token.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_shut_down() {
            bail!("timer controller is shut down");
        }
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    pub async fn get_state(&self) -> TimerState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let state = self.state.lock().await.clone();
        TimerSnapshot {
            elapsed: format_elapsed(state.elapsed((self.clock)())),
            state,
        }
    }

    fn grown_end(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        cmp::max((self.clock)(), started_at + self.placeholder)
    }

    pub async fn start(&self, label: &str, category_id: Option<CategoryId>) -> Result<ActiveTimer> {
        self.ensure_live()?;
        let label = label.trim();
        if label.is_empty() {
            bail!("timer label cannot be empty");
        }

        let mut state = self.state.lock().await;
        if state.is_running() {
            bail!("timer already active");
        }

        let started_at = (self.clock)();
        let end = started_at + self.placeholder;
        let entry = self
            .store
            .propose_create(NewEntry {
                range: TimeRange::new(started_at, end),
                label: label.to_string(),
                category_id,
            })
            .await
            .context("failed to create timer entry")?;

        let active = ActiveTimer {
            session_id: Uuid::new_v4(),
            entry_id: entry.id,
            started_at,
            label: entry.label,
            category_id,
        };
        state.begin_session(active.clone(), end);
        self.persist(Some(active.clone()));
        self.state_tx.send_replace(state.clone());
        drop(state);

        self.spawn_ticker(active.session_id).await;
        log_info!("timer {} started on entry {}", active.session_id, active.entry_id);
        Ok(active)
    }

    /// Final update to now, then clears the session.
    pub async fn stop(&self) -> Result<TimeEntry> {
        let mut state = self.state.lock().await;
        let active = state
            .active
            .clone()
            .ok_or_else(|| anyhow!("no active timer to stop"))?;

        self.cancel_ticker().await;

        let end = self.grown_end(active.started_at);
        let result = self
            .store
            .propose_update_range(active.entry_id, TimeRange::new(active.started_at, end))
            .await;

        state.cancel();
        self.persist(None);
        self.state_tx.send_replace(state.clone());

        log_info!("timer {} stopped", active.session_id);
        result.with_context(|| format!("failed to finalise timer entry {}", active.entry_id))
    }

    /// Reopens a finished entry: its end moves to now and it keeps growing
    /// from its original start.
    pub async fn restart(&self, entry: &TimeEntry) -> Result<ActiveTimer> {
        self.ensure_live()?;
        let mut state = self.state.lock().await;
        if state.is_running() {
            bail!("stop the running timer before restarting another entry");
        }

        let end = self.grown_end(entry.start);
        self.store
            .propose_update_range(entry.id, TimeRange::new(entry.start, end))
            .await
            .with_context(|| format!("failed to restart entry {}", entry.id))?;

        let active = ActiveTimer {
            session_id: Uuid::new_v4(),
            entry_id: entry.id,
            started_at: entry.start,
            label: entry.label.clone(),
            category_id: entry.category_id,
        };
        state.begin_session(active.clone(), end);
        self.persist(Some(active.clone()));
        self.state_tx.send_replace(state.clone());
        drop(state);

        self.spawn_ticker(active.session_id).await;
        log_info!("timer {} restarted entry {}", active.session_id, entry.id);
        Ok(active)
    }

    /// Picks up a timer persisted by a previous run.
    pub async fn resume(&self) -> Result<Option<ActiveTimer>> {
        self.ensure_live()?;
        let mut state = self.state.lock().await;
        if state.is_running() {
            return Ok(state.active.clone());
        }

        let Some(active) = self.preferences.active_timer() else {
            return Ok(None);
        };

        state.begin_session(active.clone(), self.grown_end(active.started_at));
        self.state_tx.send_replace(state.clone());
        drop(state);

        self.spawn_ticker(active.session_id).await;
        log_info!("resumed timer {} on entry {}", active.session_id, active.entry_id);
        Ok(Some(active))
    }

    fn persist(&self, active: Option<ActiveTimer>) {
        if let Err(err) = self.preferences.set_active_timer(active) {
            log_error!("failed to persist active timer: {err:?}");
        }
    }

    async fn spawn_ticker(&self, session_id: Uuid) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = Self {
            lifetime: None,
            ..self.clone()
        };
        let growth = self.growth_interval;
        let cancel_token = self.cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + growth, growth);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !controller.grow(session_id).await {
                            break;
                        }
                    }
                    _ = cancel_token.cancelled() => {
                        log_info!("timer {session_id} ticker shutting down");
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    /// One growth tick. Returns `false` once the session is over.
    async fn grow(&self, session_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        let active = match &state.active {
            Some(active) if active.session_id == session_id => active.clone(),
            _ => return false,
        };

        let end = self.grown_end(active.started_at);
        match self
            .store
            .propose_update_range(active.entry_id, TimeRange::new(active.started_at, end))
            .await
        {
            Ok(_) => {
                state.last_end = Some(end);
                self.state_tx.send_replace(state.clone());
                true
            }
            Err(StoreError::NotFound(entry_id)) => {
                log_warn!("timer entry {entry_id} disappeared; ending session {session_id}");
                state.cancel();
                self.persist(None);
                self.state_tx.send_replace(state.clone());
                false
            }
            Err(err) => {
                log_error!("failed to grow timer entry {}: {err}", active.entry_id);
                true
            }
        }
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{settings::SettingsStore, store::MemoryStore, timer::TimerStatus};
    use chrono::TimeZone;
    use tempfile::TempDir;
    use tokio::time::sleep;

    struct Harness {
        store: Arc<MemoryStore>,
        preferences: Arc<SettingsStore>,
        timer: TimerController<MemoryStore, SettingsStore>,
        base: DateTime<Utc>,
        _dir: TempDir,
    }

    fn virtual_clock(base: DateTime<Utc>) -> Clock {
        let origin = Instant::now();
        Arc::new(move || base + TimeDelta::from_std(origin.elapsed()).unwrap_or(TimeDelta::zero()))
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let preferences = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        let base = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let timer = TimerController::new(store.clone(), preferences.clone(), &TimelineConfig::default())
            .with_clock(virtual_clock(base));
        Harness {
            store,
            preferences,
            timer,
            base,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn running_timer_grows_its_entry() {
        let h = harness();
        let active = h.timer.start("Deep work", None).await.unwrap();

        let created = h.store.entry(active.entry_id).await.unwrap();
        assert_eq!(created.range(), TimeRange::new(h.base, h.base + TimeDelta::seconds(1)));
        assert_eq!(h.preferences.active_timer(), Some(active.clone()));

        sleep(Duration::from_millis(3_100)).await;
        let grown = h.store.entry(active.entry_id).await.unwrap();
        assert_eq!(grown.end, h.base + TimeDelta::seconds(3));

        sleep(Duration::from_secs(3)).await;
        let grown = h.store.entry(active.entry_id).await.unwrap();
        assert_eq!(grown.end, h.base + TimeDelta::seconds(6));
        assert_eq!(h.timer.get_snapshot().await.elapsed, "00:00:06");
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_blank_labels_and_second_timers() {
        let h = harness();
        assert!(h.timer.start("   ", None).await.is_err());

        h.timer.start("Reading", None).await.unwrap();
        assert!(h.timer.start("Writing", None).await.is_err());
        assert_eq!(h.store.entry_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_finalises_and_clears_state() {
        let h = harness();
        let mut updates = h.timer.subscribe();
        let active = h.timer.start("Deep work", None).await.unwrap();
        assert!(updates.borrow_and_update().is_running());

        sleep(Duration::from_secs(10)).await;
        let stopped = h.timer.stop().await.unwrap();
        assert_eq!(stopped.end, h.base + TimeDelta::seconds(10));
        assert_eq!(h.timer.get_state().await.status, TimerStatus::Idle);
        assert!(h.preferences.active_timer().is_none());

        sleep(Duration::from_secs(9)).await;
        assert_eq!(h.store.entry(active.entry_id).await.unwrap().end, stopped.end);
        assert!(h.timer.stop().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_entry_terminates_the_session() {
        let h = harness();
        let active = h.timer.start("Deep work", None).await.unwrap();
        h.store.propose_delete(active.entry_id).await.unwrap();

        sleep(Duration::from_millis(3_100)).await;
        let state = h.timer.get_state().await;
        assert!(!state.is_running());
        assert!(h.preferences.active_timer().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_reopens_a_finished_entry() {
        let h = harness();
        let earlier = h
            .store
            .propose_create(NewEntry {
                range: TimeRange::new(h.base - TimeDelta::hours(1), h.base - TimeDelta::minutes(30)),
                label: "Review".into(),
                category_id: None,
            })
            .await
            .unwrap();

        let active = h.timer.restart(&earlier).await.unwrap();
        assert_eq!(active.started_at, earlier.start);
        assert_eq!(h.store.entry(earlier.id).await.unwrap().end, h.base);

        sleep(Duration::from_millis(3_100)).await;
        let grown = h.store.entry(earlier.id).await.unwrap();
        assert_eq!(grown.start, earlier.start);
        assert_eq!(grown.end, h.base + TimeDelta::seconds(3));
        assert!(h.timer.restart(&earlier).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_handle_stops_growth() {
        let Harness {
            store,
            preferences,
            timer,
            base,
            _dir,
        } = harness();
        let active = timer.start("Deep work", None).await.unwrap();
        let extra = timer.clone();
        drop(timer);

        sleep(Duration::from_millis(3_100)).await;
        assert_eq!(store.entry(active.entry_id).await.unwrap().end, base + TimeDelta::seconds(3));

        drop(extra);
        sleep(Duration::from_secs(30)).await;
        assert_eq!(store.entry(active.entry_id).await.unwrap().end, base + TimeDelta::seconds(3));
        assert_eq!(preferences.active_timer(), Some(active));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_halts_growth_and_refuses_new_sessions() {
        let h = harness();
        let active = h.timer.start("Deep work", None).await.unwrap();
        sleep(Duration::from_millis(3_100)).await;

        h.timer.shutdown();
        assert!(h.timer.is_shut_down());
        sleep(Duration::from_secs(10)).await;
        assert_eq!(
            h.store.entry(active.entry_id).await.unwrap().end,
            h.base + TimeDelta::seconds(3)
        );

        assert!(h.timer.start("Writing", None).await.is_err());
        assert!(h.timer.resume().await.is_err());
        assert_eq!(h.preferences.active_timer(), Some(active));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_picks_up_a_persisted_timer() {
        let h = harness();
        let created = h
            .store
            .propose_create(NewEntry {
                range: TimeRange::new(h.base - TimeDelta::minutes(5), h.base - TimeDelta::minutes(4)),
                label: "Carried over".into(),
                category_id: None,
            })
            .await
            .unwrap();
        let persisted = ActiveTimer {
            session_id: Uuid::new_v4(),
            entry_id: created.id,
            started_at: created.start,
            label: created.label.clone(),
            category_id: None,
        };
        h.preferences.set_active_timer(Some(persisted.clone())).unwrap();

        assert_eq!(h.timer.resume().await.unwrap(), Some(persisted));
        sleep(Duration::from_millis(3_100)).await;
        assert_eq!(
            h.store.entry(created.id).await.unwrap().end,
            h.base + TimeDelta::seconds(3)
        );
    }
}
