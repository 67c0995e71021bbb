use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{models::ScreenshotRef, store::ScreenshotLookup};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_HOVER_DEBOUNCE_MS: u64 = 120;
pub const DEFAULT_HOVER_FADE_OUT_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverUpdate {
    /// Result of the latest lookup; `None` when there is no screenshot or
    /// the lookup failed.
    Screenshot {
        request_id: u64,
        at: DateTime<Utc>,
        screenshot: Option<ScreenshotRef>,
    },
    /// Neither the axis nor the card is hovered any more.
    Dismissed,
}

/// Debounces hover positions into screenshot lookups and drops any response
/// that is no longer for the latest request.
///
/// The axis and the card form one hover region: the card is dismissed only
/// after both have lost the pointer for the fade-out delay. Methods spawn
/// onto the current tokio runtime.
pub struct HoverLookupCoordinator<L: ScreenshotLookup> {
    lookup: Arc<L>,
    latest: Arc<AtomicU64>,
    debounce: Duration,
    fade_out: Duration,
    /// Parent of every in-flight lookup; cancelled when the pointer leaves.
    lookups: CancellationToken,
    pending: Option<CancellationToken>,
    fade: Option<CancellationToken>,
    axis_hovered: bool,
    card_hovered: bool,
    updates: mpsc::UnboundedSender<HoverUpdate>,
}

impl<L: ScreenshotLookup> HoverLookupCoordinator<L> {
    pub fn new(lookup: Arc<L>) -> (Self, mpsc::UnboundedReceiver<HoverUpdate>) {
        Self::with_timings(
            lookup,
            Duration::from_millis(DEFAULT_HOVER_DEBOUNCE_MS),
            Duration::from_millis(DEFAULT_HOVER_FADE_OUT_MS),
        )
    }

    pub fn with_timings(
        lookup: Arc<L>,
        debounce: Duration,
        fade_out: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<HoverUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            lookup,
            latest: Arc::new(AtomicU64::new(0)),
            debounce,
            fade_out,
            lookups: CancellationToken::new(),
            pending: None,
            fade: None,
            axis_hovered: false,
            card_hovered: false,
            updates,
        };
        (coordinator, rx)
    }

    pub fn latest_request_id(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, request_id: u64) -> bool {
        request_id == self.latest_request_id()
    }

    pub fn is_hovered(&self) -> bool {
        self.axis_hovered || self.card_hovered
    }

    /// Pointer moved to `at` on the axis; re-arms the debounce.
    pub fn hover(&mut self, at: DateTime<Utc>) {
        self.enter_axis();

        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        let pending = self.lookups.child_token();
        self.pending = Some(pending.clone());

        let lookups = self.lookups.clone();
        let lookup = self.lookup.clone();
        let latest = self.latest.clone();
        let updates = self.updates.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => {}
                _ = pending.cancelled() => return,
            }

            let request_id = latest.fetch_add(1, Ordering::SeqCst) + 1;
            let result = tokio::select! {
                result = lookup.lookup_screenshot(at) => result,
                _ = lookups.cancelled() => return,
            };

            if latest.load(Ordering::SeqCst) != request_id {
                log_debug!("discarding stale screenshot lookup {request_id} for {at}");
                return;
            }

            let screenshot = match result {
                Ok(found) => found.filter(ScreenshotRef::has_image),
                Err(err) => {
                    log_warn!("screenshot lookup for {at} failed: {err}");
                    None
                }
            };
            let _ = updates.send(HoverUpdate::Screenshot {
                request_id,
                at,
                screenshot,
            });
        });
    }

    pub fn enter_axis(&mut self) {
        self.axis_hovered = true;
        self.cancel_fade();
    }

    /// Invalidates any outstanding lookup immediately and starts the fade-out
    /// unless the card still holds the pointer.
    pub fn leave_axis(&mut self) {
        self.axis_hovered = false;
        self.latest.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.lookups.cancel();
        self.lookups = CancellationToken::new();

        if !self.card_hovered {
            self.start_fade();
        }
    }

    pub fn enter_card(&mut self) {
        self.card_hovered = true;
        self.cancel_fade();
    }

    pub fn leave_card(&mut self) {
        self.card_hovered = false;
        if !self.axis_hovered {
            self.start_fade();
        }
    }

    fn cancel_fade(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.cancel();
        }
    }

    fn start_fade(&mut self) {
        self.cancel_fade();
        let fade = CancellationToken::new();
        self.fade = Some(fade.clone());

        let updates = self.updates.clone();
        let fade_out = self.fade_out;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(fade_out) => {
                    let _ = updates.send(HoverUpdate::Dismissed);
                }
                _ = fade.cancelled() => {}
            }
        });
    }
}

impl<L: ScreenshotLookup> Drop for HoverLookupCoordinator<L> {
    fn drop(&mut self) {
        self.lookups.cancel();
        self.cancel_fade();
    }
}
