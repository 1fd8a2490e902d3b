//! Keeps the cache fresh for a window of days through a live subscription.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::error::{StoreError, SubscriptionError};
use crate::record::{DayEntry, DayState};
use crate::store::{
    ChangeKind, RecordChange, RecordStore, StoreSubscription, SubscriptionEvent, SubscriptionId,
};
use crate::{DayId, Window};

#[derive(Debug)]
enum SyncState {
    Idle,
    Live {
        sub: StoreSubscription,
        /// Epoch at which the snapshot landed. Until then the cache may
        /// still hold what an older subscription said about the window.
        synced_at: Option<u64>,
    },
    /// The store closed us or we couldn't subscribe. The cached days of
    /// `window` stay but are no longer kept fresh until a resubscribe.
    Lost { window: Window, reason: StoreError },
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "Idle"),
            SyncState::Live {
                sub,
                synced_at: Some(_),
            } => write!(f, "Live({} {})", sub.id(), sub.window()),
            SyncState::Live {
                sub,
                synced_at: None,
            } => write!(f, "Syncing({} {})", sub.id(), sub.window()),
            SyncState::Lost { window, reason } => write!(f, "Lost({window}: {reason})"),
        }
    }
}

/// The live window synchronizer.
///
/// Owns the cache entries of every day inside its window while the
/// subscription is live. Changing the window always releases the old
/// subscription before opening the new one, and the new subscription's
/// snapshot is taken as the whole truth about its window.
#[derive(Debug)]
pub struct LiveWindow {
    state: SyncState,
    /// Counts applied events, so a point read can tell whether the
    /// subscription wrote its day after the read was issued.
    epoch: u64,
    /// Epoch of the last batch that touched each day, current subscription
    /// only.
    written: HashMap<DayId, u64>,
    /// Windows of released subscriptions that no snapshot has replaced yet.
    retired: Option<Window>,
}

impl Default for LiveWindow {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            epoch: 0,
            written: HashMap::new(),
            retired: None,
        }
    }
}

impl LiveWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// The window we are, or were last, asked to keep fresh.
    pub fn window(&self) -> Option<Window> {
        match &self.state {
            SyncState::Idle => None,
            SyncState::Live { sub, .. } => Some(sub.window()),
            SyncState::Lost { window, .. } => Some(*window),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, SyncState::Live { .. })
    }

    /// Live, and the snapshot of the window has been applied.
    pub fn is_synced(&self) -> bool {
        matches!(
            self.state,
            SyncState::Live {
                synced_at: Some(_),
                ..
            }
        )
    }

    pub fn lost_reason(&self) -> Option<&StoreError> {
        match &self.state {
            SyncState::Lost { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn subscription_id(&self) -> Option<&SubscriptionId> {
        match &self.state {
            SyncState::Live { sub, .. } => Some(sub.id()),
            _ => None,
        }
    }

    /// True when `id` is inside a live window. Those days belong to the
    /// synchronizer.
    pub fn owns(&self, id: DayId) -> bool {
        match &self.state {
            SyncState::Live { sub, .. } => sub.window().contains(id),
            _ => false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the live subscription wrote `id` after `epoch`. A point read
    /// issued at `epoch` is older than that write and must not replace it.
    pub fn wrote_since(&self, id: DayId, epoch: u64) -> bool {
        let SyncState::Live { sub, synced_at } = &self.state else {
            return false;
        };
        if !sub.window().contains(id) {
            return false;
        }

        synced_at.is_some_and(|at| at > epoch)
            || self.written.get(&id).is_some_and(|at| *at > epoch)
    }

    /// Make sure `window` is the live window. Returns Ok(false) when it
    /// already was.
    pub fn ensure_window<F>(
        &mut self,
        store: &Arc<dyn RecordStore>,
        window: Window,
        on_event: F,
    ) -> Result<bool, StoreError>
    where
        F: Fn(&SubscriptionId, SubscriptionEvent) + Send + Sync + 'static,
    {
        if let SyncState::Live { sub, .. } = &self.state {
            if sub.window() == window {
                return Ok(false);
            }
        }

        self.resubscribe(store, window, on_event)?;
        Ok(true)
    }

    /// Release whatever subscription we hold and open a new one for `window`.
    pub fn resubscribe<F>(
        &mut self,
        store: &Arc<dyn RecordStore>,
        window: Window,
        on_event: F,
    ) -> Result<(), StoreError>
    where
        F: Fn(&SubscriptionId, SubscriptionEvent) + Send + Sync + 'static,
    {
        let before = self.state.to_string();

        self.retired = match (self.retired, self.window()) {
            (Some(retired), Some(old)) => Some(retired.hull(&old)),
            (retired, old) => retired.or(old),
        };
        self.written.clear();

        // drop the old guard first so its callbacks stop before the new
        // snapshot arrives
        self.state = SyncState::Idle;

        let result = match StoreSubscription::open(store, window, on_event) {
            Ok(sub) => {
                self.state = SyncState::Live {
                    sub,
                    synced_at: None,
                };
                Ok(())
            }
            Err(reason) => {
                warn!("LiveWindow: could not subscribe to {window}: {reason}");
                self.state = SyncState::Lost {
                    window,
                    reason: reason.clone(),
                };
                Err(reason)
            }
        };

        debug!("LiveWindow::resubscribe: {} => {}", before, self.state);
        result
    }

    /// Unsubscribe and forget the window.
    pub fn release(&mut self) {
        let before = self.state.to_string();
        self.state = SyncState::Idle;
        self.written.clear();
        self.retired = None;
        debug!("LiveWindow::release: {} => {}", before, self.state);
    }

    /// Apply one event from subscription `sub_id`. Returns whether the cache
    /// version was bumped.
    ///
    /// Events from anything but the current subscription are dropped, so a
    /// released subscription can never write into the cache. Whatever they
    /// carried is covered by the current subscription's snapshot.
    pub fn apply(
        &mut self,
        cache: &mut RecordCache,
        sub_id: &SubscriptionId,
        event: SubscriptionEvent,
    ) -> Result<bool, SubscriptionError> {
        if self.subscription_id() != Some(sub_id) {
            debug!("LiveWindow: ignoring event from stale subscription {sub_id}");
            return Ok(false);
        }

        // subscription_id matched, so we are live
        let Some(window) = self.window() else {
            return Ok(false);
        };

        match event {
            SubscriptionEvent::Snapshot(records) => {
                let before = self.state.to_string();
                self.epoch += 1;
                let epoch = self.epoch;

                let retired = self.retired.take();
                let changed = apply_snapshot(cache, window, retired, &records);

                if let SyncState::Live { synced_at, .. } = &mut self.state {
                    *synced_at = Some(epoch);
                }
                debug!("LiveWindow::apply: {} => {}", before, self.state);
                Ok(changed)
            }

            SubscriptionEvent::Batch(changes) => {
                self.epoch += 1;
                for change in &changes {
                    self.written.insert(change.id, self.epoch);
                }
                Ok(apply_batch(cache, &changes))
            }

            SubscriptionEvent::Closed(reason) => {
                let before = self.state.to_string();
                warn!("LiveWindow: subscription for {window} closed: {reason}");
                self.state = SyncState::Lost {
                    window,
                    reason: reason.clone(),
                };
                self.written.clear();
                debug!("LiveWindow::apply: {} => {}", before, self.state);
                Err(SubscriptionError::Lost(reason))
            }
        }
    }
}

/// Make the cache agree with a snapshot of `window`: listed days are
/// present, every other day in the window is absent. Days of `retired`
/// that `window` no longer covers go back to unresolved. Bumps the version
/// once if anything changed.
#[profiling::function]
pub(crate) fn apply_snapshot(
    cache: &mut RecordCache,
    window: Window,
    retired: Option<Window>,
    records: &[RecordChange],
) -> bool {
    let mut listed: HashMap<DayId, &RecordChange> = HashMap::new();
    for change in records {
        if change.kind != ChangeKind::Removed && window.contains(change.id) {
            listed.insert(change.id, change);
        }
    }

    let mut changed = false;
    let mut absent = 0usize;

    for id in window.days() {
        let state = match listed.get(&id) {
            Some(change) => DayState::Present(DayEntry::from_record(&change.record)),
            None => {
                absent += 1;
                DayState::Absent
            }
        };

        if cache.get(id) != Some(&state) {
            cache.set(id, state);
            changed = true;
        }
    }

    let mut dropped = 0usize;
    if let Some(retired) = retired {
        for id in retired.days().filter(|id| !window.contains(*id)) {
            if cache.delete(id) {
                dropped += 1;
            }
        }
    }
    changed |= dropped > 0;

    debug!(
        "snapshot of {window}: {} present, {absent} absent, {dropped} dropped outside",
        listed.len()
    );

    if changed {
        cache.bump_version();
    }

    changed
}

/// Apply a notification batch to the cache, bumping the version once if
/// anything changed.
#[profiling::function]
pub(crate) fn apply_batch(cache: &mut RecordCache, changes: &[RecordChange]) -> bool {
    let mut changed = false;

    for change in changes {
        match change.kind {
            ChangeKind::Removed => {
                changed |= cache.delete(change.id);
            }
            ChangeKind::Added | ChangeKind::Modified => {
                cache.set(
                    change.id,
                    DayState::Present(DayEntry::from_record(&change.record)),
                );
                changed = true;
            }
        }
    }

    if changed {
        cache.bump_version();
    }

    changed
}
