use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use daylog::{
    hover::{Point, Rect, Size},
    interaction::{PointerEvent, PointerKind, TimelineIntent},
    models::ScreenshotRef,
    timeline::NeighborBounds,
    AppState, Day, DayTimeline, EntryStore, MemoryStore, NewEntry, ScreenshotLookup,
    SettingsStore, StoreError, TimeRange, TimelineConfig,
};
use tempfile::TempDir;

const WIDTH: f64 = 2400.0;

fn day() -> Day {
    Day::utc(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
}

fn at(h: i64, m: i64, s: i64) -> DateTime<Utc> {
    day().start() + TimeDelta::hours(h) + TimeDelta::minutes(m) + TimeDelta::seconds(s)
}

fn x(h: i64, m: i64) -> f64 {
    (h as f64 + m as f64 / 60.0) * WIDTH / 24.0
}

fn pointer(kind: PointerKind, x: f64, y: f64) -> PointerEvent {
    PointerEvent::new(kind, x, y, Point::new(x, y))
}

async fn store_with_a_and_b() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (range, label) in [
        (TimeRange::new(at(9, 0, 0), at(10, 0, 0)), "A"),
        (TimeRange::new(at(14, 0, 0), at(15, 30, 0)), "B"),
    ] {
        store
            .propose_create(NewEntry {
                range,
                label: label.into(),
                category_id: None,
            })
            .await
            .unwrap();
    }
    store
}

async fn open(store: Arc<MemoryStore>) -> (DayTimeline<MemoryStore, SettingsStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let app = AppState::start(store, dir.path(), TimelineConfig::default())
        .await
        .unwrap();
    let timeline = app.open_day(day(), WIDTH).await.unwrap();
    (timeline, dir)
}

#[tokio::test]
async fn neighbours_and_gaps_of_a_sparse_day() {
    let (timeline, _dir) = open(store_with_a_and_b().await).await;
    let intervals = timeline.intervals();
    let a = intervals.entries()[0].id;

    assert_eq!(
        intervals.neighbor_bounds_of(a),
        Some(NeighborBounds {
            previous_end: day().start(),
            next_start: at(14, 0, 0),
        })
    );
    assert_eq!(
        intervals.gaps_within(day().start(), day().end()),
        vec![
            TimeRange::new(day().start(), at(9, 0, 0)),
            TimeRange::new(at(10, 0, 0), at(14, 0, 0)),
            TimeRange::new(at(15, 30, 0), day().end()),
        ]
    );
}

#[tokio::test]
async fn dragging_free_space_creates_an_entry() {
    let (mut timeline, _dir) = open(store_with_a_and_b().await).await;

    timeline.pointer(pointer(PointerKind::Down, x(11, 0), 50.0));
    timeline.pointer(pointer(PointerKind::Move, x(12, 30), 50.0));
    assert_eq!(
        timeline.drag_preview(),
        Some(TimeRange::new(at(11, 0, 0), at(12, 30, 0)))
    );

    let intents = timeline.pointer(pointer(PointerKind::Up, x(12, 30), 50.0));
    let [TimelineIntent::ProposeCreate { range }] = intents.as_slice() else {
        panic!("expected one create intent, got {intents:?}");
    };

    let created = timeline.create_entry(*range, "  Writing  ", None).await.unwrap();
    assert_eq!(created.label, "Writing");
    assert_eq!(timeline.intervals().len(), 3);
    assert!(timeline.intervals().is_consistent());
}

#[tokio::test]
async fn resizing_b_toward_a_stops_at_ten() {
    let (mut timeline, _dir) = open(store_with_a_and_b().await).await;
    let b = timeline.intervals().entries()[1].id;

    timeline.pointer(pointer(PointerKind::Down, x(14, 0) + 1.0, 50.0));
    timeline.pointer(pointer(PointerKind::Move, x(9, 30), 50.0));
    let intents = timeline.pointer(pointer(PointerKind::Up, x(9, 30), 50.0));

    assert_eq!(
        intents,
        vec![TimelineIntent::ProposeUpdateRange {
            entry_id: b,
            range: TimeRange::new(at(10, 0, 0), at(15, 30, 0)),
        }]
    );

    let updated = timeline
        .update_range(b, TimeRange::new(at(10, 0, 0), at(15, 30, 0)))
        .await
        .unwrap();
    assert_eq!(updated.start, at(10, 0, 0));
    assert_eq!(timeline.intervals().neighbor_bounds_of(b).unwrap().previous_end, at(10, 0, 0));
}

#[tokio::test]
async fn overlapping_update_refreshes_the_local_set() {
    let store = store_with_a_and_b().await;
    let (mut timeline, _dir) = open(store.clone()).await;
    let a = timeline.intervals().entries()[0].id;

    // Another writer fills the gap after A.
    store
        .propose_create(NewEntry {
            range: TimeRange::new(at(10, 15, 0), at(11, 0, 0)),
            label: "Call".into(),
            category_id: None,
        })
        .await
        .unwrap();
    assert_eq!(timeline.intervals().len(), 2);

    let err = timeline
        .update_range(a, TimeRange::new(at(9, 0, 0), at(10, 30, 0)))
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::Overlap));
    assert_eq!(timeline.intervals().len(), 3);
    assert_eq!(
        timeline.intervals().neighbor_bounds_of(a).unwrap().next_start,
        at(10, 15, 0)
    );
}

#[tokio::test]
async fn process_runs_and_hover_cards() {
    let store = store_with_a_and_b().await;
    let focus = store.add_category("Focus", "#22c55e").await;
    for (ts, name) in [
        (at(9, 0, 0), "chrome"),
        (at(9, 0, 20), "code"),
        (at(9, 0, 50), "chrome"),
        (at(9, 0, 51), "loginwindow"),
        (at(10, 0, 0), "slack"),
        (at(10, 10, 0), "code"),
        (at(11, 0, 0), "mail"),
    ] {
        store.record_process_sample(ts, name).await;
    }
    store.record_screenshot(at(9, 30, 10), "/shots/0930.png").await;

    let (mut timeline, _dir) = open(store.clone()).await;
    let a = timeline.intervals().entries()[0].id;
    timeline
        .update_details(
            a,
            daylog::EntryDetails {
                label: None,
                category_id: Some(Some(focus.id)),
            },
        )
        .await
        .unwrap();

    let runs = timeline.process_runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].process_name, "code");
    assert_eq!(runs[0].range(), TimeRange::new(at(10, 0, 0), at(14, 0, 0)));
    assert!((timeline.process_blocks()[0].x - x(10, 0)).abs() < 1e-6);

    let anchor = Point::new(300.0, 60.0);
    let card = timeline.hover_card(anchor, at(9, 30, 0)).unwrap();
    assert_eq!(card.label.as_deref(), Some("A"));
    assert_eq!(card.category_name.as_deref(), Some("Focus"));
    let ranking: Vec<(&str, u64)> = card
        .top_processes
        .iter()
        .map(|usage| (usage.process_name.as_str(), usage.seconds))
        .collect();
    assert_eq!(
        ranking,
        vec![("loginwindow", 3_549), ("code", 30), ("chrome", 21)]
    );

    let screenshot: Option<ScreenshotRef> = store.lookup_screenshot(card.at).await.unwrap();
    let card = card.with_screenshot(screenshot);
    assert!(card.screenshot.is_some());

    let free = timeline.hover_card(anchor, at(12, 0, 0)).unwrap();
    assert!(free.is_free_time());
    assert_eq!(free.range, TimeRange::new(at(10, 0, 0), at(14, 0, 0)));
    assert_eq!(free.top_processes[0].process_name, "code");

    let placement = timeline.place_card(
        anchor,
        Size::new(200.0, 120.0),
        Size::new(1200.0, 800.0),
        Rect::new(0.0, 0.0, 1200.0, 120.0),
    );
    assert_eq!(placement.overlap_area, 0.0);
}

#[tokio::test(start_paused = true)]
async fn running_timer_survives_a_restart() {
    let store = Arc::new(MemoryStore::new());
    let dir = tempfile::tempdir().unwrap();

    let app = AppState::start(store.clone(), dir.path(), TimelineConfig::default())
        .await
        .unwrap();
    let active = app.timer.start("Deep work", None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    assert!(store.entry(active.entry_id).await.unwrap().duration() >= TimeDelta::seconds(1));
    drop(app);

    let parked = store.entry(active.entry_id).await.unwrap().end;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.entry(active.entry_id).await.unwrap().end, parked);

    let restarted = AppState::start(store.clone(), dir.path(), TimelineConfig::default())
        .await
        .unwrap();
    let state = restarted.timer.get_state().await;
    assert!(state.is_running());
    assert_eq!(state.active.unwrap().entry_id, active.entry_id);

    let stopped = restarted.timer.stop().await.unwrap();
    assert_eq!(stopped.id, active.entry_id);
}

#[tokio::test(start_paused = true)]
async fn hovering_the_axis_fills_and_dismisses_the_card() {
    let store = store_with_a_and_b().await;
    store.record_screenshot(at(9, 30, 10), "/shots/0930.png").await;
    let (mut timeline, _dir) = open(store).await;

    let intents = timeline.pointer(pointer(PointerKind::Move, x(9, 30), 50.0));
    assert!(matches!(intents.as_slice(), [TimelineIntent::Hover { .. }]));
    let card = timeline.current_card().unwrap();
    assert_eq!(card.label.as_deref(), Some("A"));
    assert!(card.screenshot.is_none());

    assert_eq!(timeline.hover_update().await, Some(true));
    let (card, placement) = timeline
        .placed_card(
            Size::new(200.0, 120.0),
            Size::new(1200.0, 800.0),
            Rect::new(0.0, 0.0, 1200.0, 120.0),
        )
        .unwrap();
    assert_eq!(card.screenshot.unwrap().timestamp, at(9, 30, 10));
    assert_eq!(card.anchor, Point::new(x(9, 30), 50.0));
    assert_eq!(placement.overlap_area, 0.0);

    timeline.pointer(pointer(PointerKind::Leave, x(9, 30), 50.0));
    assert!(timeline.current_card().is_some());
    assert_eq!(timeline.hover_update().await, Some(true));
    assert!(timeline.current_card().is_none());
}
