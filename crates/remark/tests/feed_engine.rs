use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use remark::{
    CacheLookup, DayId, DayRecord, Error, FeedEngine, FeedSettings, MemoryStore, StoreError,
    StoreRecord, SubscriptionError, ViewMode,
};

const WAIT: Duration = Duration::from_secs(5);

fn day(s: &str) -> DayId {
    s.parse().unwrap()
}

/// Only the trailing window, no extra months, so tests control exactly
/// which days are live.
fn recent_only(days_window: u32) -> FeedSettings {
    FeedSettings {
        days_window,
        initial_months: 1,
        ..Default::default()
    }
}

fn mount(memory: &Arc<MemoryStore>, settings: FeedSettings, today: &str) -> FeedEngine {
    FeedEngine::mount(memory.clone(), settings, day(today)).unwrap()
}

/// Poll until the resolver has nothing in flight.
fn settle(engine: &mut FeedEngine) {
    while engine.fetches_in_flight() > 0 {
        engine.poll_timeout(WAIT).unwrap();
    }
}

#[test]
fn removal_inside_the_live_window_bumps_once() {
    let memory = Arc::new(MemoryStore::with_records([
        (
            day("2024-06-01"),
            StoreRecord::titled("june").with_cover("full.jpg").with_thumb("thumb.jpg"),
        ),
        (day("2024-05-20"), StoreRecord::titled("may")),
    ]));
    let mut engine = mount(&memory, recent_only(120), "2024-06-30");

    assert!(engine.poll().unwrap());
    let before = engine.version();
    assert_eq!(
        engine.get(day("2024-06-01")),
        Some(DayRecord {
            exists: true,
            cover_ref: Some("thumb.jpg".to_string()),
            title: Some("june".to_string()),
        })
    );

    memory.remove(day("2024-06-01")).unwrap();
    assert!(engine.poll().unwrap());

    assert_eq!(engine.version(), before + 1);
    assert_eq!(engine.get(day("2024-06-01")), None);
    assert!(engine.lookup(day("2024-06-01")).is_unresolved());
    assert_eq!(engine.lookup(day("2024-05-20")).title(), Some("may"));

    // the next time it is on screen a point read confirms it
    assert_eq!(engine.on_viewport_visible(&[day("2024-06-01")]), 1);
    settle(&mut engine);
    assert_eq!(engine.lookup(day("2024-06-01")), CacheLookup::Absent);
}

#[test]
fn batched_writes_bump_once_and_unchanged_snapshots_never() {
    let memory = Arc::new(MemoryStore::new());
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");

    // the first snapshot confirms every day in the window, once
    assert!(engine.poll().unwrap());
    assert_eq!(engine.version(), 1);

    memory
        .upsert_many([
            (day("2024-06-10"), StoreRecord::titled("a")),
            (day("2024-06-11"), StoreRecord::titled("b")),
            (day("2024-06-12"), StoreRecord::titled("c")),
        ])
        .unwrap();
    assert!(engine.poll().unwrap());
    assert_eq!(engine.version(), 2);

    // outside the window, nobody hears about it
    memory
        .upsert(day("2023-01-01"), StoreRecord::titled("old"))
        .unwrap();
    assert!(!engine.poll().unwrap());
    assert_eq!(engine.version(), 2);

    engine.resubscribe().unwrap();
    assert!(!engine.poll().unwrap());
    assert_eq!(engine.version(), 2);
}

#[test]
fn modified_records_keep_merged_fields() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2024-06-10"),
        StoreRecord::titled("first").with_cover("full.jpg"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();
    assert_eq!(engine.lookup(day("2024-06-10")).cover_ref(), Some("full.jpg"));

    memory
        .upsert(day("2024-06-10"), StoreRecord::default().with_thumb("t.jpg"))
        .unwrap();
    engine.poll().unwrap();

    let lookup = engine.lookup(day("2024-06-10"));
    assert_eq!(lookup.cover_ref(), Some("t.jpg"));
    assert_eq!(lookup.title(), Some("first"));
}

#[test]
fn scrolling_back_and_forth_fetches_each_day_once() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2023-03-03"),
        StoreRecord::titled("long ago"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();

    let visible = [day("2023-03-03"), day("2023-03-02")];
    assert_eq!(engine.on_viewport_visible(&visible), 2);
    assert_eq!(engine.on_viewport_visible(&visible), 0);
    settle(&mut engine);
    assert_eq!(engine.on_viewport_visible(&visible), 0);

    assert_eq!(memory.fetch_count(), 2);
    assert_eq!(engine.fetches_issued(), 2);
    assert_eq!(engine.lookup(day("2023-03-03")).title(), Some("long ago"));
    assert_eq!(engine.lookup(day("2023-03-02")), CacheLookup::Absent);
    assert_eq!(engine.get(day("2023-03-02")).map(|r| r.exists), Some(false));
}

#[test]
fn live_days_and_future_days_are_not_fetched() {
    let memory = Arc::new(MemoryStore::new());
    let mut engine = mount(&memory, recent_only(30), "2024-06-15");

    // the snapshot is still on its way
    let visible = [day("2024-06-10"), day("2024-06-16"), day("2024-06-30")];
    assert_eq!(engine.on_viewport_visible(&visible), 0);

    engine.poll().unwrap();
    assert_eq!(engine.on_viewport_visible(&visible), 0);
    assert_eq!(engine.lookup(day("2024-06-10")), CacheLookup::Absent);
    assert_eq!(memory.fetch_count(), 0);
}

#[test]
fn empty_days_in_the_window_end_absent() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2024-06-20"),
        StoreRecord::titled("x"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();

    for id in [day("2024-06-25"), day("2024-06-01"), day("2024-05-26")] {
        assert_eq!(engine.lookup(id), CacheLookup::Absent, "{id}");
    }
    assert_eq!(engine.lookup(day("2024-06-20")).title(), Some("x"));
    assert_eq!(engine.lookup(day("2024-05-25")), CacheLookup::Unresolved);
    assert_eq!(memory.fetch_count(), 0);
}

#[test]
fn failed_reads_retry_on_next_visibility() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2023-03-03"),
        StoreRecord::titled("long ago"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();
    let version = engine.version();

    memory.set_offline(true);
    assert_eq!(engine.on_viewport_visible(&[day("2023-03-03")]), 1);
    settle(&mut engine);
    assert!(engine.lookup(day("2023-03-03")).is_unresolved());
    assert_eq!(engine.version(), version);

    memory.set_offline(false);
    assert_eq!(engine.on_viewport_visible(&[day("2023-03-03")]), 1);
    settle(&mut engine);
    assert_eq!(engine.lookup(day("2023-03-03")).title(), Some("long ago"));
    assert_eq!(engine.version(), version + 1);
}

#[test]
fn dropped_subscription_is_surfaced_and_recoverable() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2024-06-20"),
        StoreRecord::titled("x"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();

    memory.drop_subscriptions("backend restarted");
    let err = engine.poll().unwrap_err();
    assert!(matches!(
        err,
        Error::Subscription(SubscriptionError::Lost(StoreError::Closed(_)))
    ));
    assert!(!engine.is_live());

    // writes made while we were gone show up in the new snapshot
    memory
        .upsert(day("2024-06-21"), StoreRecord::titled("y"))
        .unwrap();
    engine.resubscribe().unwrap();
    assert!(engine.is_live());
    assert!(engine.poll().unwrap());
    assert_eq!(engine.lookup(day("2024-06-21")).title(), Some("y"));
    assert_eq!(memory.subscriber_count(), 1);
}

#[test]
fn removals_while_disconnected_are_seen_after_resubscribe() {
    let memory = Arc::new(MemoryStore::with_records([(
        day("2024-06-20"),
        StoreRecord::titled("x"),
    )]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();
    assert_eq!(engine.lookup(day("2024-06-20")).title(), Some("x"));

    memory.drop_subscriptions("backend restarted");
    assert!(engine.poll().is_err());

    memory.remove(day("2024-06-20")).unwrap();
    engine.resubscribe().unwrap();
    assert!(engine.poll().unwrap());
    assert_eq!(engine.lookup(day("2024-06-20")), CacheLookup::Absent);
    assert_eq!(engine.get(day("2024-06-20")).map(|r| r.exists), Some(false));
}

#[test]
fn removals_pending_across_a_window_change_are_not_lost() {
    let memory = Arc::new(MemoryStore::with_records([
        (day("2024-06-20"), StoreRecord::titled("x")),
        (day("2024-06-21"), StoreRecord::titled("y")),
    ]));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    engine.poll().unwrap();

    // the removal is queued for the subscription the next call replaces
    memory.remove(day("2024-06-20")).unwrap();
    assert!(engine.load_more_months().unwrap());
    assert!(engine.poll().unwrap());
    assert_eq!(engine.lookup(day("2024-06-20")), CacheLookup::Absent);
    assert_eq!(engine.lookup(day("2024-06-21")).title(), Some("y"));

    memory.remove(day("2024-06-21")).unwrap();
    assert!(engine.set_today(day("2024-07-01")).unwrap());
    assert!(engine.poll().unwrap());
    assert_eq!(engine.lookup(day("2024-06-21")), CacheLookup::Absent);
    assert_eq!(memory.subscriber_count(), 1);
}

#[test]
fn mount_fails_when_the_store_is_unreachable() {
    let memory = Arc::new(MemoryStore::new());
    memory.set_offline(true);
    let result = FeedEngine::mount(memory.clone(), recent_only(30), day("2024-06-30"));
    assert!(matches!(
        result,
        Err(Error::Store(StoreError::Unavailable(_)))
    ));
}

#[test]
fn unmount_releases_the_subscription_and_drops_late_reads() {
    let memory = Arc::new(MemoryStore::new());
    memory.set_fetch_delay(Some(Duration::from_millis(50)));
    let mut engine = mount(&memory, recent_only(30), "2024-06-30");
    assert_eq!(memory.subscriber_count(), 1);

    engine.on_viewport_visible(&[day("2020-01-01")]);
    engine.unmount();
    assert_eq!(memory.subscriber_count(), 0);

    // nothing is listening any more
    memory
        .upsert(day("2024-06-20"), StoreRecord::titled("late"))
        .unwrap();
    assert_eq!(memory.subscriber_count(), 0);
}

#[test]
fn future_cells_are_inert_even_with_records() {
    let memory = Arc::new(MemoryStore::with_records([
        (
            day("2024-06-20"),
            StoreRecord::titled("not yet").with_cover("nope.jpg"),
        ),
        (
            day("2024-06-10"),
            StoreRecord::titled("past").with_cover("yes.jpg"),
        ),
    ]));
    let mut engine = mount(&memory, FeedSettings::default(), "2024-06-15");
    engine.poll().unwrap();

    // the June grid is inside the live window, so the record is cached
    assert_eq!(engine.lookup(day("2024-06-20")).cover_ref(), Some("nope.jpg"));

    let june = engine.months()[0].matrix().unwrap();
    let future = june
        .iter()
        .find(|cell| cell.iso == day("2024-06-20"))
        .copied()
        .unwrap();
    let view = engine.cell_view(future);
    assert!(view.is_future);
    assert!(!view.navigable);
    assert_eq!(view.cover, None);
    assert_eq!(engine.cover(day("2024-06-20")), None);
    assert_eq!(engine.open_day(day("2024-06-20")), None);

    let past = june
        .iter()
        .find(|cell| cell.iso == day("2024-06-10"))
        .copied()
        .unwrap();
    let view = engine.cell_view(past);
    assert!(view.navigable);
    assert_eq!(view.cover, Some("yes.jpg"));
    assert_eq!(engine.open_day(day("2024-06-15")), Some(day("2024-06-15")));

    let today = june
        .iter()
        .find(|cell| cell.iso == day("2024-06-15"))
        .copied()
        .unwrap();
    assert!(engine.cell_view(today).is_today);
    assert!(engine.cell_view(today).navigable);
}

#[test]
fn real_only_shows_days_with_records() {
    let memory = Arc::new(MemoryStore::with_records([
        (day("2024-06-29"), StoreRecord::titled("a")),
        (day("2024-06-01"), StoreRecord::titled("b")),
    ]));
    let mut engine = mount(&memory, recent_only(120), "2024-06-30");
    engine.poll().unwrap();

    assert_eq!(engine.visible_days().len(), 90);
    engine.set_real_only(true);
    assert_eq!(
        engine.visible_days(),
        vec![day("2024-06-29"), day("2024-06-01")]
    );
}

#[test]
fn settings_pick_the_starting_view() {
    let memory = Arc::new(MemoryStore::new());
    let settings = FeedSettings {
        start_view: ViewMode::Calendar,
        ..recent_only(30)
    };
    let mut engine = mount(&memory, settings, "2024-06-30");
    assert_eq!(engine.view_mode(), ViewMode::Calendar);
    assert_eq!(engine.button_label(), "Grid");
    assert_eq!(engine.cycle_view_mode().to, ViewMode::Grid);
}
