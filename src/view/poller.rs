use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    models::ProcessSample,
    store::EntryStore,
    timeline::Day,
    timer::Clock,
};

const ENABLE_LOGS: bool = true;
const POLL_TIMEOUT_SECS: u64 = 10;

use crate::{log_error, log_info, log_warn};

/// Fresh process samples and screenshot times, tagged with the day they
/// were fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub day: Day,
    pub samples: Vec<ProcessSample>,
    pub screenshot_times: Vec<DateTime<Utc>>,
}

/// Background refresh of the live day. Exits on its own once the day no
/// longer contains now.
pub struct DayPoller {
    day: Day,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl DayPoller {
    pub fn spawn<S: EntryStore>(
        store: Arc<S>,
        day: Day,
        every: Duration,
        clock: Clock,
    ) -> (Self, mpsc::UnboundedReceiver<PollResult>) {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            store,
            day,
            every,
            clock,
            cancel_token.clone(),
            results_tx,
        ));

        (
            Self {
                day,
                handle: Some(handle),
                cancel_token,
            },
            results_rx,
        )
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.await.context("day poller task failed to join")?;
        }
        Ok(())
    }
}

impl Drop for DayPoller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop<S: EntryStore>(
    store: Arc<S>,
    day: Day,
    every: Duration,
    clock: Clock,
    cancel_token: CancellationToken,
    results: mpsc::UnboundedSender<PollResult>,
) {
    let mut ticker = time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log_info!("day poller started for {}", day.date());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !day.contains(clock()) {
                    log_info!("day {} is over; poller stopping", day.date());
                    break;
                }

                match time::timeout(Duration::from_secs(POLL_TIMEOUT_SECS), fetch(store.as_ref(), day)).await {
                    Ok(Ok(result)) => {
                        if results.send(result).is_err() {
                            break;
                        }
                    }
                    Ok(Err(err)) => log_error!("day poll failed for {}: {err:?}", day.date()),
                    Err(_) => log_warn!("day poll timeout (> {}s) for {}", POLL_TIMEOUT_SECS, day.date()),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("day poller shutting down");
                break;
            }
        }
    }
}

async fn fetch<S: EntryStore>(store: &S, day: Day) -> Result<PollResult> {
    let samples = store
        .list_process_samples(day)
        .await
        .context("failed to list process samples")?;
    let screenshot_times = store
        .list_screenshot_times(day)
        .await
        .context("failed to list screenshot times")?;
    Ok(PollResult {
        day,
        samples,
        screenshot_times,
    })
}
