//! The feed engine: everything a journal screen needs between mount and
//! unmount.
//!
//! The engine is the only writer of its [`RecordCache`]. Store callbacks and
//! resolver workers never touch it; they post a [`FeedMessage`] to the
//! engine's inbox, and the hosting screen calls [`FeedEngine::poll`] once per
//! frame to apply whatever arrived. Renderers compare
//! [`FeedEngine::version`] against the last version they drew and re-read
//! the cache when it moved.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as chan;
use tracing::{debug, info, warn};

use crate::cache::RecordCache;
use crate::calendar::{cell_view, CellView, DayCell, MonthDef, MonthList};
use crate::date_feed::DateFeed;
use crate::loader::worker_count;
use crate::error::{StoreError, SubscriptionError};
use crate::record::{CacheLookup, DayRecord, StoreRecord};
use crate::resolver::{LazyResolver, ResolveAction};
use crate::settings::FeedSettings;
use crate::store::{RecordStore, SubscriptionEvent, SubscriptionId};
use crate::sync::LiveWindow;
use crate::view_mode::{GestureEvent, ModeTransition, ViewMode, ViewModeMachine};
use crate::{DayId, Error, Result, Window};

/// Work finished off the engine's thread, waiting to be applied.
#[derive(Debug)]
pub enum FeedMessage {
    Sync {
        sub: SubscriptionId,
        event: SubscriptionEvent,
    },
    Resolved {
        id: DayId,
        result: std::result::Result<Option<StoreRecord>, StoreError>,
    },
}

pub struct FeedEngine {
    store: Arc<dyn RecordStore>,
    settings: FeedSettings,
    today: DayId,

    cache: RecordCache,
    live: LiveWindow,
    resolver: LazyResolver,

    days: DateFeed,
    months: MonthList,
    view: ViewModeMachine,
    real_only: bool,

    inbox_tx: chan::Sender<FeedMessage>,
    inbox_rx: chan::Receiver<FeedMessage>,
}

impl FeedEngine {
    /// Mount a feed anchored at `today`: start the resolver workers and
    /// subscribe to the live window.
    pub fn mount(store: Arc<dyn RecordStore>, settings: FeedSettings, today: DayId) -> Result<Self> {
        let (inbox_tx, inbox_rx) = chan::unbounded();

        let mut resolver = LazyResolver::new();
        resolver.start(
            store.clone(),
            inbox_tx.clone(),
            worker_count(settings.resolver_workers),
        )?;

        let mut engine = Self {
            days: DateFeed::new(today, settings.page_size),
            months: MonthList::new(
                today,
                settings.initial_months,
                settings.month_batch,
                settings.month_layout,
            ),
            view: ViewModeMachine::new(settings.start_view, settings.pinch_threshold),
            real_only: settings.real_only,
            store,
            settings,
            today,
            cache: RecordCache::new(),
            live: LiveWindow::new(),
            resolver,
            inbox_tx,
            inbox_rx,
        };

        engine.sync_window()?;

        info!(
            "mounted feed at {today}, live window {}",
            engine.desired_window()
        );

        Ok(engine)
    }

    /// Tear down. Same as dropping the engine.
    pub fn unmount(self) {}

    pub fn today(&self) -> DayId {
        self.today
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    //
    // reads
    //

    /// Every generated day, newest first, records or not.
    pub fn days(&self) -> &[DayId] {
        self.days.days()
    }

    /// The days the grid and list views should draw. With the real-only
    /// filter on, only days known to have a record.
    pub fn visible_days(&self) -> Vec<DayId> {
        if !self.real_only {
            return self.days.days().to_vec();
        }

        self.days
            .days()
            .iter()
            .copied()
            .filter(|id| self.cache.lookup(*id).exists() == Some(true))
            .collect()
    }

    pub fn real_only(&self) -> bool {
        self.real_only
    }

    pub fn version(&self) -> u64 {
        self.cache.version()
    }

    /// `None` while the day is unresolved.
    pub fn get(&self, id: DayId) -> Option<DayRecord> {
        self.cache.lookup(id).record()
    }

    pub fn lookup(&self, id: DayId) -> CacheLookup<'_> {
        self.cache.lookup(id)
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Feed cover for `id`. Never anything for a future day.
    pub fn cover(&self, id: DayId) -> Option<&str> {
        if id.is_future(self.today) {
            return None;
        }
        self.cache.lookup(id).cover_ref()
    }

    pub fn months(&self) -> &[MonthDef] {
        self.months.months()
    }

    pub fn month_list(&self) -> &MonthList {
        &self.months
    }

    pub fn cell_view(&self, cell: DayCell) -> CellView<'_> {
        cell_view(cell, self.today, &self.cache)
    }

    pub fn is_navigable(&self, id: DayId) -> bool {
        !id.is_future(self.today)
    }

    /// The day to open when `id` is tapped, if it may be opened at all.
    pub fn open_day(&self, id: DayId) -> Option<DayId> {
        if !self.is_navigable(id) {
            debug!("refusing to open future day {id}");
            return None;
        }
        Some(id)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn button_label(&self) -> &'static str {
        self.view.button_label()
    }

    /// The window the live subscription covers, or last covered if it was
    /// lost.
    pub fn live_window(&self) -> Option<Window> {
        self.live.window()
    }

    pub fn is_live(&self) -> bool {
        self.live.is_live()
    }

    pub fn fetches_issued(&self) -> u64 {
        self.resolver.fetches_issued()
    }

    pub fn fetches_in_flight(&self) -> usize {
        self.resolver.in_flight_count()
    }

    //
    // triggers
    //

    /// Extend the day sequence by one page. Returns the number of new days.
    pub fn load_more(&mut self) -> usize {
        self.days.load_more().len()
    }

    /// Extend the calendar by a batch of older months and widen the live
    /// window to cover them.
    pub fn load_more_months(&mut self) -> Result<bool> {
        if !self.months.load_more_months() {
            return Ok(false);
        }

        self.sync_window()?;
        Ok(true)
    }

    /// Report the last calendar month the renderer shows. Near the end of
    /// an infinite list the next batch is loaded.
    pub fn on_months_visible(&mut self, last_visible: usize) -> Result<bool> {
        if !self.months.near_end(last_visible) {
            return Ok(false);
        }
        self.load_more_months()
    }

    /// Report the days the renderer currently shows. Unresolved days get a
    /// point read, except inside a live window whose snapshot hasn't landed
    /// yet. Returns how many reads were queued.
    #[profiling::function]
    pub fn on_viewport_visible(&mut self, ids: &[DayId]) -> usize {
        let mut queued = 0;

        for &id in ids {
            if id.is_future(self.today) {
                continue;
            }

            // the snapshot will settle it
            if self.live.owns(id) && !self.live.is_synced() {
                continue;
            }

            if self.resolver.ensure_loaded(&self.cache, &self.live, id) == ResolveAction::Fetching {
                queued += 1;
            }
        }

        queued
    }

    pub fn handle_gesture(&mut self, event: GestureEvent<'_>) -> Option<ModeTransition> {
        self.view.handle_gesture(event)
    }

    pub fn cycle_view_mode(&mut self) -> ModeTransition {
        self.view.cycle()
    }

    pub fn set_real_only(&mut self, real_only: bool) {
        self.real_only = real_only;
    }

    /// Move the anchor when the day rolls over. Both sequences restart from
    /// the new day and the live window follows.
    pub fn set_today(&mut self, today: DayId) -> Result<bool> {
        if today == self.today {
            return Ok(false);
        }

        info!("feed day rolled over: {} => {}", self.today, today);
        self.today = today;
        self.days.reanchor(today);
        self.months.reanchor(today);
        self.sync_window()?;
        Ok(true)
    }

    //
    // inbox
    //

    /// Apply everything waiting in the inbox. Returns whether the version
    /// moved.
    ///
    /// If the live subscription was dropped by the store, every other
    /// message is still applied and then the loss is returned as an error.
    /// Call [`FeedEngine::resubscribe`] to recover.
    pub fn poll(&mut self) -> Result<bool> {
        let mut changed = false;
        let mut lost = None;

        while let Ok(msg) = self.inbox_rx.try_recv() {
            changed |= self.process_message(msg, &mut lost);
        }

        match lost {
            Some(err) => Err(Error::Subscription(err)),
            None => Ok(changed),
        }
    }

    /// Like [`FeedEngine::poll`], but wait up to `timeout` for the first
    /// message.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Result<bool> {
        let mut lost = None;

        let changed = match self.inbox_rx.recv_timeout(timeout) {
            Ok(msg) => self.process_message(msg, &mut lost),
            Err(_) => return Ok(false),
        };

        let rest = self.poll();
        if let Some(err) = lost {
            return Err(Error::Subscription(err));
        }

        Ok(rest? || changed)
    }

    /// Drop the current subscription, if any, and subscribe again.
    pub fn resubscribe(&mut self) -> Result<()> {
        let window = self.desired_window();
        let sink = self.sink();
        self.live.resubscribe(&self.store, window, sink)?;
        Ok(())
    }

    fn process_message(&mut self, msg: FeedMessage, lost: &mut Option<SubscriptionError>) -> bool {
        match msg {
            FeedMessage::Sync { sub, event } => {
                match self.live.apply(&mut self.cache, &sub, event) {
                    Ok(changed) => changed,
                    Err(err) => {
                        *lost = Some(err);
                        false
                    }
                }
            }

            FeedMessage::Resolved { id, result } => {
                self.resolver
                    .apply_result(&mut self.cache, &self.live, id, result)
            }
        }
    }

    /// The recent days plus every displayed month.
    fn desired_window(&self) -> Window {
        let recent = Window::trailing(self.today, self.settings.days_window);
        match self.months.window() {
            Some(months) => recent.hull(&months),
            None => recent,
        }
    }

    fn sync_window(&mut self) -> Result<bool> {
        let window = self.desired_window();
        let sink = self.sink();
        Ok(self.live.ensure_window(&self.store, window, sink)?)
    }

    fn sink(&self) -> impl Fn(&SubscriptionId, SubscriptionEvent) + Send + Sync + 'static {
        let inbox = self.inbox_tx.clone();
        move |sub: &SubscriptionId, event: SubscriptionEvent| {
            if inbox
                .send(FeedMessage::Sync {
                    sub: sub.clone(),
                    event,
                })
                .is_err()
            {
                warn!("feed inbox closed, dropping event for {sub}");
            }
        }
    }
}

impl Drop for FeedEngine {
    fn drop(&mut self) {
        self.live.release();
        info!(
            "unmounted feed at {}, {} read(s) abandoned",
            self.today,
            self.resolver.in_flight_count()
        );
    }
}
