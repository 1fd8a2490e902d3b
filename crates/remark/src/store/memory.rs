use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::{EventCallback, RecordChange, RecordStore, SubscriptionEvent, SubscriptionId};
use crate::error::StoreError;
use crate::record::StoreRecord;
use crate::{DayId, Window};

struct Listener {
    window: Window,
    on_event: EventCallback,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<DayId, StoreRecord>,
    listeners: HashMap<SubscriptionId, Listener>,
    offline: bool,
    fetch_delay: Option<Duration>,
}

impl Inner {
    fn notify(&self, changes: &[RecordChange]) {
        for listener in self.listeners.values() {
            let batch: Vec<RecordChange> = changes
                .iter()
                .filter(|change| listener.window.contains(change.id))
                .cloned()
                .collect();

            if !batch.is_empty() {
                (listener.on_event)(SubscriptionEvent::Batch(batch));
            }
        }
    }
}

/// An in-process record store.
///
/// Behaves like a document store with live queries: subscribers first get
/// everything in range, then one batch per write. Reads and subscriptions
/// can be made to fail, and point reads are counted, which is what the
/// engine tests and the headless host need.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fetches: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = (DayId, StoreRecord)>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.records.extend(records);
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Upsert-merge a single record.
    pub fn upsert(&self, id: DayId, patch: StoreRecord) -> Result<(), StoreError> {
        self.upsert_many([(id, patch)])
    }

    /// Upsert-merge several records. Each subscriber sees them as one batch.
    pub fn upsert_many(
        &self,
        patches: impl IntoIterator<Item = (DayId, StoreRecord)>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let records = &mut inner.records;
        let mut changes = Vec::new();

        for (id, patch) in patches {
            let change = match records.get_mut(&id) {
                Some(existing) => {
                    existing.merge(patch);
                    RecordChange::modified(id, existing.clone())
                }
                None => {
                    records.insert(id, patch.clone());
                    RecordChange::added(id, patch)
                }
            };
            changes.push(change);
        }

        inner.notify(&changes);
        Ok(())
    }

    /// Delete a record, returning what was there.
    pub fn remove(&self, id: DayId) -> Result<Option<StoreRecord>, StoreError> {
        let mut inner = self.lock()?;
        let Some(record) = inner.records.remove(&id) else {
            return Ok(None);
        };

        inner.notify(&[RecordChange::removed(id, record.clone())]);
        Ok(Some(record))
    }

    /// While offline, point reads and new subscriptions fail.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.lock() {
            inner.offline = offline;
        }
    }

    /// Hold every point read for `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        if let Ok(mut inner) = self.lock() {
            inner.fetch_delay = delay;
        }
    }

    /// Close every live subscription, the way a store does when it loses its
    /// backend.
    pub fn drop_subscriptions(&self, reason: &str) {
        let Ok(mut inner) = self.lock() else {
            return;
        };

        let listeners: Vec<Listener> = inner.listeners.drain().map(|(_, l)| l).collect();
        drop(inner);

        warn!(
            "memory store closing {} subscription(s): {reason}",
            listeners.len()
        );
        for listener in listeners {
            (listener.on_event)(SubscriptionEvent::Closed(StoreError::Closed(
                reason.to_string(),
            )));
        }
    }

    /// Number of point reads served so far, failed ones included.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().map(|inner| inner.listeners.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn get_by_id(&self, id: DayId) -> Result<Option<StoreRecord>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let (offline, delay) = {
            let inner = self.lock()?;
            (inner.offline, inner.fetch_delay)
        };

        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        if offline {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }

        Ok(self.lock()?.records.get(&id).cloned())
    }

    fn subscribe_range(
        &self,
        sub_id: SubscriptionId,
        window: Window,
        on_event: EventCallback,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.offline {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }

        let snapshot: Vec<RecordChange> = inner
            .records
            .range(window.start()..=window.end())
            .map(|(id, record)| RecordChange::added(*id, record.clone()))
            .collect();

        debug!(
            "memory store: {sub_id} watching {window}, {} record(s) in range",
            snapshot.len()
        );

        on_event(SubscriptionEvent::Snapshot(snapshot));
        inner
            .listeners
            .insert(sub_id, Listener { window, on_event });

        Ok(())
    }

    fn unsubscribe(&self, sub_id: &SubscriptionId) {
        if let Ok(mut inner) = self.lock() {
            inner.listeners.remove(sub_id);
        }
    }
}
