//! The seam between the feed engine and wherever journal records live.
//!
//! The engine only needs two things from a store: a point read by day, and a
//! live range subscription that delivers batched change notifications.
//! Writes are the editing screens' business, not ours.

mod memory;

pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::StoreRecord;
use crate::{DayId, Window};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    pub kind: ChangeKind,
    pub id: DayId,
    /// For removals this is the last known state of the record.
    pub record: StoreRecord,
}

impl RecordChange {
    pub fn added(id: DayId, record: StoreRecord) -> Self {
        Self {
            kind: ChangeKind::Added,
            id,
            record,
        }
    }

    pub fn modified(id: DayId, record: StoreRecord) -> Self {
        Self {
            kind: ChangeKind::Modified,
            id,
            record,
        }
    }

    pub fn removed(id: DayId, record: StoreRecord) -> Self {
        Self {
            kind: ChangeKind::Removed,
            id,
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// The first event of every subscription: every record in range, as
    /// `Added`. A day in range that isn't listed has no record.
    Snapshot(Vec<RecordChange>),

    /// One notification batch, after the snapshot.
    Batch(Vec<RecordChange>),

    /// The store gave up on this subscription. No further events follow.
    Closed(StoreError),
}

pub type EventCallback = Box<dyn Fn(SubscriptionEvent) + Send + Sync>;

pub trait RecordStore: Send + Sync {
    /// Point read. `Ok(None)` means the day has no record.
    fn get_by_id(&self, id: DayId) -> Result<Option<StoreRecord>, StoreError>;

    /// Watch every record whose id falls in `window`, ordered by id. The
    /// first event is always a [`SubscriptionEvent::Snapshot`], even when
    /// the range is empty.
    ///
    /// `on_event` may be called from any thread, including from inside this
    /// call for the initial snapshot.
    fn subscribe_range(
        &self,
        sub_id: SubscriptionId,
        window: Window,
        on_event: EventCallback,
    ) -> Result<(), StoreError>;

    /// After this returns no more events are delivered for `sub_id`.
    fn unsubscribe(&self, sub_id: &SubscriptionId);
}

/// A live range subscription. Dropping it unsubscribes.
pub struct StoreSubscription {
    id: SubscriptionId,
    window: Window,
    store: Arc<dyn RecordStore>,
}

impl StoreSubscription {
    /// Subscribe to `window`. Every event handed to `on_event` is tagged with
    /// the id of the subscription it came from, so late events from a
    /// released subscription can be told apart.
    pub fn open<F>(
        store: &Arc<dyn RecordStore>,
        window: Window,
        on_event: F,
    ) -> Result<Self, StoreError>
    where
        F: Fn(&SubscriptionId, SubscriptionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let tagged = id.clone();
        store.subscribe_range(
            id.clone(),
            window,
            Box::new(move |event| on_event(&tagged, event)),
        )?;

        debug!("subscribed {id} to {window}");

        Ok(Self {
            id,
            window,
            store: store.clone(),
        })
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn window(&self) -> Window {
        self.window
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.store.unsubscribe(&self.id);
        debug!("unsubscribed {} from {}", self.id, self.window);
    }
}

impl fmt::Debug for StoreSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscription")
            .field("id", &self.id)
            .field("window", &self.window)
            .finish()
    }
}
