//! A host for the feed engine without a screen: mount, let the feed settle,
//! print what each view mode would draw.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use remark::calendar::weekday_label;
use remark::{
    CacheLookup, DataPath, DayId, Error, FeedEngine, FeedSettings, MemoryStore, RecordStore,
    Result, SettingsHandler, ViewMode,
};
use tracing::{info, warn};

use crate::seed::load_seed;
use crate::{Args, RemarkOptions};

/// How long a frame waits for the store before drawing anyway.
pub const FRAME_WAIT: Duration = Duration::from_millis(250);

const MAX_SETTLE_FRAMES: usize = 64;
const GRID_COLUMNS: usize = 3;

pub struct Headless {
    engine: FeedEngine,
    rows: usize,
}

impl Headless {
    pub fn new(engine: FeedEngine, rows: usize) -> Self {
        Self { engine, rows }
    }

    pub fn engine(&self) -> &FeedEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FeedEngine {
        &mut self.engine
    }

    /// The day ids the current view mode puts on screen. In the calendar
    /// that is every cell of the shown grids, spill-over days included.
    pub fn visible_ids(&self) -> Vec<DayId> {
        match self.engine.view_mode() {
            ViewMode::Calendar => self
                .engine
                .months()
                .iter()
                .take(self.rows)
                .filter_map(|month| month.matrix())
                .flat_map(|cells| cells.into_iter())
                .map(|cell| cell.iso)
                .collect(),

            ViewMode::Grid | ViewMode::List => {
                let mut days = self.engine.visible_days();
                days.truncate(self.rows);
                days
            }
        }
    }

    /// One frame: report what is visible, then apply whatever the store
    /// sent. A dropped subscription is re-established on the spot.
    #[profiling::function]
    pub fn frame(&mut self, wait: Duration) -> Result<bool> {
        if self.engine.view_mode() == ViewMode::Calendar {
            let shown = self.rows.min(self.engine.months().len());
            self.engine.on_months_visible(shown.saturating_sub(1))?;
        }

        let visible = self.visible_ids();
        self.engine.on_viewport_visible(&visible);

        match self.engine.poll_timeout(wait) {
            Ok(changed) => Ok(changed),
            Err(Error::Subscription(err)) => {
                warn!("{err}, resubscribing");
                self.engine.resubscribe()?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    /// Run frames until nothing changes and no reads are pending.
    pub fn settle(&mut self, wait: Duration) -> Result<()> {
        for _ in 0..MAX_SETTLE_FRAMES {
            let changed = self.frame(wait)?;
            if !changed && self.engine.fetches_in_flight() == 0 {
                return Ok(());
            }
        }

        warn!(
            "feed still busy after {MAX_SETTLE_FRAMES} frames, {} read(s) in flight",
            self.engine.fetches_in_flight()
        );
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let engine = &self.engine;

        let live = match engine.live_window() {
            Some(window) if engine.is_live() => window.to_string(),
            Some(window) => format!("{window} (lost)"),
            None => "none".to_string(),
        };
        let _ = writeln!(
            out,
            "{} | v{} | live {} | [{}]",
            engine.view_mode(),
            engine.version(),
            live,
            engine.button_label()
        );

        match engine.view_mode() {
            ViewMode::Calendar => self.render_calendar(&mut out),
            ViewMode::Grid => self.render_grid(&mut out),
            ViewMode::List => self.render_list(&mut out),
        }

        out
    }

    fn render_calendar(&self, out: &mut String) {
        for month in self.engine.months().iter().take(self.rows) {
            let Some(cells) = month.matrix() else {
                continue;
            };

            let _ = writeln!(out, "\n{}", month.label());
            let header: Vec<String> = (0..7).map(|i| format!("{:<4}", weekday_label(i))).collect();
            let _ = writeln!(out, "{}", header.concat().trim_end());

            for week in cells.chunks(7) {
                let line: String = week
                    .iter()
                    .map(|cell| {
                        if !cell.in_current_month {
                            return "    ".to_string();
                        }
                        let view = self.engine.cell_view(*cell);
                        let mark = if view.is_today {
                            '@'
                        } else if view.cover.is_some() {
                            '*'
                        } else {
                            ' '
                        };
                        format!("{:>2}{} ", cell.day_of_month, mark)
                    })
                    .collect();
                let _ = writeln!(out, "{}", line.trim_end());
            }
        }
    }

    fn render_grid(&self, out: &mut String) {
        let mut days = self.engine.visible_days();
        days.truncate(self.rows);

        for row in days.chunks(GRID_COLUMNS) {
            let line: Vec<String> = row
                .iter()
                .map(|id| format!("{} {}", id.format_mdy(), marker(self.engine.lookup(*id))))
                .collect();
            let _ = writeln!(out, "{}", line.join("  "));
        }
    }

    fn render_list(&self, out: &mut String) {
        let mut days = self.engine.visible_days();
        days.truncate(self.rows);

        for id in days {
            let parts = id.parts();
            let lookup = self.engine.lookup(id);
            let title = lookup.title().unwrap_or("");
            let cover = self
                .engine
                .cover(id)
                .map(|c| format!(" <{c}>"))
                .unwrap_or_default();
            let line = format!(
                "{} {} {} {} {}{}",
                parts.month,
                parts.day,
                parts.year,
                marker(lookup),
                title,
                cover
            );
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }
}

/// `#` record with a cover, `+` record, `.` no record, `?` not known yet.
fn marker(lookup: CacheLookup<'_>) -> char {
    match lookup {
        CacheLookup::Present(entry) if entry.cover_ref.is_some() => '#',
        CacheLookup::Present(_) => '+',
        CacheLookup::Absent => '.',
        CacheLookup::Unresolved => '?',
    }
}

/// Mount a feed as the command line describes and print it.
pub fn run(args: &Args, path: &DataPath) -> Result<String> {
    let mut settings = if args.options.contains(RemarkOptions::NoSettings) {
        FeedSettings::default()
    } else {
        let mut handler = SettingsHandler::new(path).load();
        if args.options.contains(RemarkOptions::ResetSettings) {
            handler.reset()?;
        }
        handler.settings()
    };
    args.apply_to(&mut settings);

    let store: Arc<dyn RecordStore> = match &args.seed {
        Some(seed) => Arc::new(load_seed(Path::new(seed))?),
        None => Arc::new(MemoryStore::new()),
    };

    let today = args.today.unwrap_or_else(DayId::today_utc);
    let engine = FeedEngine::mount(store, settings, today)?;
    let mut host = Headless::new(engine, args.rows);
    host.settle(FRAME_WAIT)?;

    info!(
        "feed settled at v{} after {} read(s)",
        host.engine().version(),
        host.engine().fetches_issued()
    );

    Ok(host.render())
}
