//! The day view: one selected day, its authoritative entries and activity,
//! the scrollable axis, the pointer state machine and the hover card, glued
//! to the entry store and the preferences file.

pub mod poller;

pub use poller::{DayPoller, PollResult};

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::{
    activity::{derive_process_runs, ActivityTimeline},
    config::TimelineConfig,
    hover::{CardPlacement, HoverCard, HoverLookupCoordinator, HoverUpdate, Point, Rect, Size},
    interaction::{InteractionState, PointerEvent, TimelineIntent, TimelineInteraction},
    models::{Category, CategoryId, EntryId, ProcessRun, ProcessSample, TimeEntry},
    settings::Preferences,
    store::{EntryDetails, EntryStore, NewEntry, ScreenshotLookup, StoreError},
    timeline::{
        layout::{self, EntryBlock, ProcessBlock, ScreenshotMarker},
        AxisViewport, Day, IntervalSet, TimeAxisProjection, TimeRange, WheelInput, WheelOutcome,
        ZoomState,
    },
    timer::{system_clock, Clock},
};

/// Everything fetched for one day in a single refresh.
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub day: Day,
    pub entries: Vec<TimeEntry>,
    pub categories: Vec<Category>,
    pub samples: Vec<ProcessSample>,
    pub screenshot_times: Vec<DateTime<Utc>>,
}

impl DaySnapshot {
    pub async fn fetch<S: EntryStore>(store: &S, day: Day) -> Result<Self> {
        let entries = store
            .list_entries(day)
            .await
            .with_context(|| format!("failed to list entries for {}", day.date()))?;
        let categories = store
            .list_categories()
            .await
            .context("failed to list categories")?;
        let samples = store
            .list_process_samples(day)
            .await
            .with_context(|| format!("failed to list process samples for {}", day.date()))?;
        let screenshot_times = store
            .list_screenshot_times(day)
            .await
            .with_context(|| format!("failed to list screenshots for {}", day.date()))?;

        Ok(Self {
            day,
            entries,
            categories,
            samples,
            screenshot_times,
        })
    }
}

pub struct DayTimeline<S: EntryStore + ScreenshotLookup, P: Preferences> {
    store: Arc<S>,
    preferences: Arc<P>,
    config: TimelineConfig,
    clock: Clock,
    day: Day,
    intervals: IntervalSet,
    categories: Vec<Category>,
    activity: ActivityTimeline,
    screenshot_times: Vec<DateTime<Utc>>,
    viewport: AxisViewport,
    interaction: TimelineInteraction,
    poller: Option<DayPoller>,
    hover: HoverLookupCoordinator<S>,
    hover_updates: mpsc::UnboundedReceiver<HoverUpdate>,
    card: Option<HoverCard>,
}

impl<S: EntryStore + ScreenshotLookup, P: Preferences> DayTimeline<S, P> {
    /// Builds the view for `day` at the persisted zoom and loads it.
    pub async fn open(
        store: Arc<S>,
        preferences: Arc<P>,
        config: TimelineConfig,
        container_width: f64,
        day: Day,
    ) -> Result<Self> {
        let zoom = preferences.zoom();
        let (hover, hover_updates) = HoverLookupCoordinator::with_timings(
            store.clone(),
            config.hover_debounce,
            config.hover_fade_out,
        );
        let mut timeline = Self {
            store,
            preferences,
            clock: system_clock(),
            day,
            intervals: IntervalSet::empty(day),
            categories: Vec::new(),
            activity: ActivityTimeline::with_tail(Vec::new(), config.last_sample_tail),
            screenshot_times: Vec::new(),
            viewport: AxisViewport::new(container_width, zoom),
            interaction: TimelineInteraction::new(config.min_entry_duration),
            poller: None,
            hover,
            hover_updates,
            card: None,
            config,
        };
        timeline.refresh().await?;
        Ok(timeline)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn intervals(&self) -> &IntervalSet {
        &self.intervals
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn activity(&self) -> &ActivityTimeline {
        &self.activity
    }

    pub fn screenshot_times(&self) -> &[DateTime<Utc>] {
        &self.screenshot_times
    }

    pub fn viewport(&self) -> &AxisViewport {
        &self.viewport
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn drag_preview(&self) -> Option<TimeRange> {
        self.interaction.drag_preview()
    }

    pub fn projection(&self) -> TimeAxisProjection {
        self.viewport.projection(self.day.start())
    }

    /// Switches days. Drops in-flight interaction and the old day's poller.
    pub async fn select_day(&mut self, day: Day) -> Result<()> {
        if day == self.day {
            return Ok(());
        }

        self.stop_poller().await;
        self.hover.leave_axis();
        self.card = None;
        self.interaction = TimelineInteraction::new(self.config.min_entry_duration);
        self.day = day;
        self.intervals = IntervalSet::empty(day);
        self.activity = ActivityTimeline::with_tail(Vec::new(), self.config.last_sample_tail);
        self.screenshot_times.clear();
        self.refresh().await
    }

    pub async fn previous_day(&mut self) -> Result<()> {
        self.select_day(self.day.previous()).await
    }

    pub async fn next_day(&mut self) -> Result<()> {
        self.select_day(self.day.next()).await
    }

    pub async fn today(&mut self) -> Result<()> {
        self.select_day(Day::today()).await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let snapshot = DaySnapshot::fetch(self.store.as_ref(), self.day).await?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    /// Replaces the day's data. Snapshots for another day are dropped.
    pub fn apply_snapshot(&mut self, snapshot: DaySnapshot) -> bool {
        if snapshot.day != self.day {
            debug!(
                "discarding snapshot for {} while viewing {}",
                snapshot.day.date(),
                self.day.date()
            );
            return false;
        }

        self.intervals = IntervalSet::new(self.day, snapshot.entries);
        self.categories = snapshot.categories;
        self.activity = ActivityTimeline::with_tail(snapshot.samples, self.config.last_sample_tail);
        self.screenshot_times = snapshot.screenshot_times;
        true
    }

    pub fn apply_poll(&mut self, result: PollResult) -> bool {
        if result.day != self.day {
            debug!(
                "discarding poll result for {} while viewing {}",
                result.day.date(),
                self.day.date()
            );
            return false;
        }

        self.activity = ActivityTimeline::with_tail(result.samples, self.config.last_sample_tail);
        self.screenshot_times = result.screenshot_times;
        true
    }

    /// Starts polling when the selected day contains now. Returns the result
    /// stream to feed back through [`Self::apply_poll`].
    pub async fn start_poller(&mut self) -> Option<mpsc::UnboundedReceiver<PollResult>> {
        self.stop_poller().await;
        if !self.day.contains((self.clock)()) {
            return None;
        }

        let (poller, results) = DayPoller::spawn(
            self.store.clone(),
            self.day,
            self.config.poll_interval,
            self.clock.clone(),
        );
        self.poller = Some(poller);
        Some(results)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(DayPoller::is_running)
    }

    pub async fn stop_poller(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            if let Err(err) = poller.stop().await {
                warn!("day poller for {} did not stop cleanly: {err:?}", poller.day().date());
            }
        }
    }

    /// Feeds one pointer event through the state machine. Hover intents
    /// also drive the card and its screenshot lookup before being returned.
    pub fn pointer(&mut self, event: PointerEvent) -> Vec<TimelineIntent> {
        let projection = self.projection();
        let blocks = self.entry_blocks();
        let intents = self
            .interaction
            .handle(event, &projection, &self.intervals, &blocks);

        for intent in &intents {
            match *intent {
                // The process lane shares the axis card.
                TimelineIntent::Hover { at, client }
                | TimelineIntent::ProcessBarHover { at, client } => self.hover_at(client, at),
                TimelineIntent::HoverEnd => self.hover.leave_axis(),
                _ => {}
            }
        }
        intents
    }

    fn hover_at(&mut self, client: Point, at: DateTime<Utc>) {
        let Some(card) = self.hover_card(client, at) else {
            return;
        };
        if self.card.as_ref().is_some_and(|shown| shown.at == at) {
            self.hover.enter_axis();
            return;
        }
        self.card = Some(card);
        self.hover.hover(at);
    }

    /// The card currently shown, if any.
    pub fn current_card(&self) -> Option<&HoverCard> {
        self.card.as_ref()
    }

    pub fn enter_card(&mut self) {
        self.hover.enter_card();
    }

    pub fn leave_card(&mut self) {
        self.hover.leave_card();
    }

    /// Applies one coordinator update. Screenshots for anything but the
    /// latest request at the shown instant are dropped.
    pub fn apply_hover_update(&mut self, update: HoverUpdate) -> bool {
        match update {
            HoverUpdate::Screenshot {
                request_id,
                at,
                screenshot,
            } => {
                if !self.hover.is_current(request_id) {
                    debug!("discarding screenshot for stale hover request {request_id}");
                    return false;
                }
                match self.card.take() {
                    Some(card) if card.at == at => {
                        self.card = Some(card.with_screenshot(screenshot));
                        true
                    }
                    other => {
                        self.card = other;
                        false
                    }
                }
            }
            HoverUpdate::Dismissed => {
                if self.hover.is_hovered() {
                    return false;
                }
                self.card.take().is_some()
            }
        }
    }

    /// Waits for the next coordinator update and applies it.
    pub async fn hover_update(&mut self) -> Option<bool> {
        let update = self.hover_updates.recv().await?;
        Some(self.apply_hover_update(update))
    }

    /// The shown card together with where it goes on screen.
    pub fn placed_card(
        &self,
        card_size: Size,
        viewport: Size,
        axis: Rect,
    ) -> Option<(HoverCard, CardPlacement)> {
        let card = self.card.clone()?;
        let placement = self.place_card(card.anchor, card_size, viewport, axis);
        Some((card, placement))
    }

    pub fn tick(&mut self) {
        self.interaction.tick();
    }

    /// Applies a wheel gesture; zoom changes are persisted.
    pub fn wheel(&mut self, input: WheelInput) -> Result<WheelOutcome> {
        let outcome = self.viewport.wheel(input);
        if let WheelOutcome::Zoomed(zoom) = outcome {
            self.preferences
                .set_zoom(zoom)
                .context("failed to persist zoom level")?;
        }
        Ok(outcome)
    }

    /// Zoom buttons: anchored on the viewport centre.
    pub fn set_zoom(&mut self, zoom: ZoomState) -> Result<bool> {
        if !self.viewport.zoom_centered(zoom) {
            return Ok(false);
        }
        self.preferences
            .set_zoom(zoom)
            .context("failed to persist zoom level")?;
        Ok(true)
    }

    pub fn resize_container(&mut self, container_width: f64) {
        self.viewport.resize(container_width);
    }

    pub async fn create_entry(
        &mut self,
        range: TimeRange,
        label: &str,
        category_id: Option<CategoryId>,
    ) -> Result<TimeEntry> {
        let result = self
            .store
            .propose_create(NewEntry {
                range,
                label: label.to_string(),
                category_id,
            })
            .await;
        self.settle(result, "failed to create entry").await
    }

    pub async fn update_range(&mut self, entry_id: EntryId, range: TimeRange) -> Result<TimeEntry> {
        let result = self.store.propose_update_range(entry_id, range).await;
        self.settle(result, "failed to update entry range").await
    }

    pub async fn update_details(
        &mut self,
        entry_id: EntryId,
        details: EntryDetails,
    ) -> Result<TimeEntry> {
        let result = self.store.update_details(entry_id, details).await;
        self.settle(result, "failed to update entry details").await
    }

    pub async fn delete_entry(&mut self, entry_id: EntryId) -> Result<()> {
        let result = self.store.propose_delete(entry_id).await;
        self.settle(result, "failed to delete entry").await
    }

    /// Re-reads the day after a store command. An overlap means the local
    /// set was stale, so it is refreshed before the error goes back up.
    async fn settle<T>(&mut self, result: Result<T, StoreError>, what: &'static str) -> Result<T> {
        match result {
            Ok(value) => {
                self.refresh().await?;
                Ok(value)
            }
            Err(StoreError::Overlap) => {
                info!("store rejected overlapping range; refreshing {}", self.day.date());
                if let Err(err) = self.refresh().await {
                    warn!("refresh after overlap failed: {err:?}");
                }
                Err(StoreError::Overlap).context(what)
            }
            Err(err) => Err(err).context(what),
        }
    }

    pub fn process_runs(&self) -> Vec<ProcessRun> {
        derive_process_runs(
            &self.intervals.occupied_ranges(),
            &self.activity,
            self.day.start(),
            self.day.end(),
        )
    }

    pub fn entry_blocks(&self) -> Vec<EntryBlock> {
        layout::entry_blocks(
            &self.projection(),
            &self.intervals,
            &self.categories,
            self.interaction.resize_preview(),
        )
    }

    pub fn process_blocks(&self) -> Vec<ProcessBlock> {
        layout::process_blocks(&self.projection(), &self.process_runs())
    }

    pub fn screenshot_markers(&self) -> Vec<ScreenshotMarker> {
        layout::screenshot_markers(&self.projection(), &self.screenshot_times)
    }

    pub fn hover_card(&self, anchor: Point, at: DateTime<Utc>) -> Option<HoverCard> {
        HoverCard::compose(
            anchor,
            at,
            &self.intervals,
            &self.categories,
            &self.activity,
            self.config.top_process_limit,
        )
    }

    pub fn place_card(&self, anchor: Point, card: Size, viewport: Size, axis: Rect) -> CardPlacement {
        self.config.positioner().place(anchor, card, viewport, axis)
    }
}
