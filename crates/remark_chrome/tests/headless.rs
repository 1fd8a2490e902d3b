use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use remark::{
    DataPath, FeedEngine, FeedSettings, MemoryStore, SettingsHandler, StoreRecord, ViewMode,
};
use remark_chrome::headless::FRAME_WAIT;
use remark_chrome::{run, Args, Headless};

fn args(list: &[&str]) -> Args {
    let list: Vec<String> = list.iter().map(|s| s.to_string()).collect();
    let (args, unrecognized) = Args::parse(&list);
    assert!(unrecognized.is_empty(), "unrecognized: {unrecognized:?}");
    args
}

fn write_seed(dir: &Path) -> String {
    let path = dir.join("seed.json");
    fs::write(
        &path,
        r#"{
            "2024-06-30": { "title": "Hike", "coverUrl": "hike.jpg", "thumbCoverUrl": "hike_t.jpg" },
            "2024-06-29": { "title": "Rest" },
            "2024-06-20": { "title": "Picnic", "coverUrl": "picnic.jpg" },
            "2024-06-10": { "title": "Rain", "coverUrl": "rain.jpg" },
            "2024-06-01": { "title": "Start" },
            "2024-05-31": { "title": "Beach", "coverUrl": "beach.jpg", "thumbCoverUrl": "beach_t.jpg" }
        }"#,
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn grid_shows_live_records_and_placeholders() {
    let tmp = tempfile::TempDir::new().unwrap();
    let seed = write_seed(tmp.path());
    let datapath = tmp.path().to_string_lossy().into_owned();

    let args = args(&[
        "--datapath", &datapath, "--seed", &seed, "--today", "2024-06-30", "--rows", "6",
    ]);
    let out = run(&args, &DataPath::new(&datapath)).unwrap();

    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec![
            "Grid | v1 | live [2023-12-31, 2024-07-06] | [List]",
            "06-30-2024 #  06-29-2024 +  06-28-2024 .",
            "06-27-2024 .  06-26-2024 .  06-25-2024 .",
        ]
    );
}

#[test]
fn list_resolves_days_outside_the_window() {
    let tmp = tempfile::TempDir::new().unwrap();
    let seed = write_seed(tmp.path());
    let datapath = tmp.path().to_string_lossy().into_owned();

    let mut settings = SettingsHandler::new(&DataPath::new(&datapath)).load();
    settings.update_batch(|s| {
        s.days_window = 2;
        s.initial_months = 1;
    });

    let args = args(&[
        "--datapath", &datapath, "--seed", &seed, "--today", "2024-06-02", "--view", "list",
        "--rows", "10",
    ]);
    let out = run(&args, &DataPath::new(&datapath)).unwrap();

    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec![
            "List | v3 | live [2024-05-26, 2024-07-06] | [Calendar]",
            "JUN 02 2024 .",
            "JUN 01 2024 + Start",
            "MAY 31 2024 # Beach <beach_t.jpg>",
            "MAY 30 2024 .",
            "MAY 29 2024 .",
            "MAY 28 2024 .",
            "MAY 27 2024 .",
            "MAY 26 2024 .",
            "MAY 25 2024 .",
            "MAY 24 2024 .",
        ]
    );
}

#[test]
fn reset_settings_forgets_the_saved_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let datapath = tmp.path().to_string_lossy().into_owned();
    let path = DataPath::new(&datapath);

    let mut settings = SettingsHandler::new(&path).load();
    settings.update_batch(|s| {
        s.days_window = 2;
        s.start_view = ViewMode::List;
    });

    let args = args(&[
        "--datapath", &datapath, "--today", "2024-06-30", "--rows", "0", "--reset-settings",
    ]);
    let out = run(&args, &path).unwrap();

    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec!["Grid | v1 | live [2023-12-31, 2024-07-06] | [List]"]
    );
    assert_eq!(
        SettingsHandler::new(&path).load().settings(),
        FeedSettings::default()
    );
}

#[test]
fn calendar_spill_over_cells_are_live() {
    let memory = Arc::new(MemoryStore::with_records([(
        "2024-05-28".parse().unwrap(),
        StoreRecord::titled("late may").with_cover("may.jpg"),
    )]));
    let settings = FeedSettings {
        start_view: ViewMode::Calendar,
        ..Default::default()
    };
    let engine = FeedEngine::mount(memory.clone(), settings, "2024-06-15".parse().unwrap()).unwrap();
    let mut host = Headless::new(engine, 1);
    host.settle(FRAME_WAIT).unwrap();

    let window = host.engine().live_window().unwrap();
    let visible = host.visible_ids();
    assert_eq!(visible.len(), 42);
    assert!(visible.iter().all(|id| window.contains(*id)));
    assert_eq!(memory.fetch_count(), 0);
    assert_eq!(
        host.engine().lookup("2024-05-28".parse().unwrap()).title(),
        Some("late may")
    );
}

#[test]
fn calendar_hides_future_covers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let seed = write_seed(tmp.path());
    let datapath = tmp.path().to_string_lossy().into_owned();

    let args = args(&[
        "--datapath", &datapath, "--seed", &seed, "--today", "2024-06-15", "--view", "calendar",
        "--rows", "1", "--no-settings",
    ]);
    let out = run(&args, &DataPath::new(&datapath)).unwrap();

    assert!(out.starts_with("Calendar | v1 |"), "{out}");
    assert!(out.contains("June 2024"));
    assert!(out.contains("SUN MON TUE WED THU FRI SAT"));
    assert!(out.contains("10*"));
    assert!(out.contains("15@"));
    assert!(!out.contains("20*"));
}

#[test]
fn real_only_drops_empty_days() {
    let tmp = tempfile::TempDir::new().unwrap();
    let seed = write_seed(tmp.path());
    let datapath = tmp.path().to_string_lossy().into_owned();

    let args = args(&[
        "--datapath", &datapath, "--seed", &seed, "--today", "2024-06-30", "--view", "list",
        "--real-only", "--rows", "3", "--no-settings",
    ]);
    let out = run(&args, &DataPath::new(&datapath)).unwrap();

    assert_eq!(
        out.lines().skip(1).collect::<Vec<_>>(),
        vec![
            "JUN 30 2024 # Hike <hike_t.jpg>",
            "JUN 29 2024 + Rest",
            "JUN 20 2024 # Picnic <picnic.jpg>",
        ]
    );
}

#[test]
fn frames_recover_a_dropped_subscription() {
    let memory = Arc::new(MemoryStore::new());
    let engine = FeedEngine::mount(
        memory.clone(),
        FeedSettings::default(),
        "2024-06-30".parse().unwrap(),
    )
    .unwrap();
    let mut host = Headless::new(engine, 3);
    host.settle(FRAME_WAIT).unwrap();

    memory.drop_subscriptions("restart");
    memory
        .upsert("2024-06-30".parse().unwrap(), StoreRecord::titled("back"))
        .unwrap();

    assert!(host.frame(FRAME_WAIT).unwrap());
    assert!(host.engine().is_live());
    host.settle(FRAME_WAIT).unwrap();
    assert_eq!(
        host.engine()
            .lookup("2024-06-30".parse().unwrap())
            .title(),
        Some("back")
    );
}

#[test]
fn missing_seed_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let datapath = tmp.path().to_string_lossy().into_owned();
    let missing = tmp.path().join("nope.json").to_string_lossy().into_owned();

    let args = args(&["--datapath", &datapath, "--seed", &missing, "--no-settings"]);
    assert!(run(&args, &DataPath::new(&datapath)).is_err());
}
