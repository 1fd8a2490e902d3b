use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use crossbeam_channel as chan;
use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::error::StoreError;
use crate::feed::FeedMessage;
use crate::loader::AsyncLoader;
use crate::record::{DayState, StoreRecord};
use crate::store::RecordStore;
use crate::sync::LiveWindow;
use crate::DayId;

/// What [`LazyResolver::ensure_loaded`] decided to do about a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a Skipped result means the day is still unresolved"]
pub enum ResolveAction {
    /// Already resolved, nothing to do.
    Cached,
    /// A read for this day is already on its way.
    InFlight,
    /// A point read was queued.
    Fetching,
    /// The workers aren't running, the day stays unresolved.
    Skipped,
}

/// On-demand point reads for days nobody is keeping fresh.
///
/// Days the cache knows about, in any state, are never fetched again, and a
/// day is never fetched twice while a read for it is pending.
pub struct LazyResolver {
    loader: AsyncLoader<DayId>,
    /// Pending reads, with the synchronizer epoch they were issued at
    in_flight: HashMap<DayId, u64>,
    fetches_issued: u64,
}

impl Default for LazyResolver {
    fn default() -> Self {
        Self {
            loader: AsyncLoader::new(),
            in_flight: HashMap::new(),
            fetches_issued: 0,
        }
    }
}

impl LazyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spin up the read workers. Results come back to `inbox` as
    /// [`FeedMessage::Resolved`].
    pub fn start(
        &mut self,
        store: Arc<dyn RecordStore>,
        inbox: chan::Sender<FeedMessage>,
        workers: usize,
    ) -> io::Result<bool> {
        self.loader.start(
            store,
            inbox,
            workers,
            "remark-resolver",
            |id, store: &Arc<dyn RecordStore>, inbox| {
                let result = store.get_by_id(id);
                if inbox.send(FeedMessage::Resolved { id, result }).is_err() {
                    // the feed was unmounted while we were reading
                    debug!("resolver: dropping late result for {id}");
                }
            },
        )
    }

    pub fn ensure_loaded(
        &mut self,
        cache: &RecordCache,
        live: &LiveWindow,
        id: DayId,
    ) -> ResolveAction {
        if cache.is_resolved(id) {
            return ResolveAction::Cached;
        }

        if self.in_flight.contains_key(&id) {
            return ResolveAction::InFlight;
        }

        if !self.loader.send(id) {
            warn!("resolver: workers not running, {id} stays unresolved");
            return ResolveAction::Skipped;
        }

        self.in_flight.insert(id, live.epoch());
        self.fetches_issued += 1;
        ResolveAction::Fetching
    }

    pub fn is_in_flight(&self, id: DayId) -> bool {
        self.in_flight.contains_key(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Point reads queued over the resolver's lifetime.
    pub fn fetches_issued(&self) -> u64 {
        self.fetches_issued
    }

    /// Write a finished read into the cache. Returns whether the version was
    /// bumped.
    ///
    /// Failed reads leave the day unresolved so the next time it is visible
    /// it gets fetched again. A read is dropped when the live subscription
    /// wrote the same day after the read was issued.
    pub fn apply_result(
        &mut self,
        cache: &mut RecordCache,
        live: &LiveWindow,
        id: DayId,
        result: Result<Option<StoreRecord>, StoreError>,
    ) -> bool {
        // a result nobody asked for is older than anything the
        // synchronizer wrote
        let issued_at = self.in_flight.remove(&id).unwrap_or(0);

        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!("resolver: could not load {id}: {err}");
                return false;
            }
        };

        if live.wrote_since(id, issued_at) {
            debug!("resolver: live window wrote {id} after the read, dropping it");
            return false;
        }

        cache.set(id, DayState::from_fetch(record.as_ref()));
        cache.bump_version();
        true
    }
}
