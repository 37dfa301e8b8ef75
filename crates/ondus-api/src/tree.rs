// ── Generic resource-node plumbing ──
//
// Locations, rooms and appliances share one shape: an attribute snapshot
// plus (for the first two) an id-addressable child collection that is
// filled lazily and merged by id on every update.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::warn;

/// Raw attribute snapshot of a resource as returned by the API.
pub type Record = serde_json::Map<String, Value>;

/// A node that can live in a [`Collection`].
pub(crate) trait Resource: Clone {
    type Id: PartialEq + fmt::Debug;

    /// Human-readable kind, used in log messages.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    /// Identity of a raw record, `None` when the id field is missing.
    fn record_id(record: &Record) -> Option<Self::Id>;

    /// Replace the node's attributes in place.
    fn update(&self, record: Record);
}

/// Ordered, id-unique collection of node handles.
///
/// Order is discovery order. Handles are cloned out, never moved, so a
/// caller holding one keeps observing later updates.
///
/// The collection counts as loaded once any non-empty batch was merged,
/// even when every record in it was declined.
pub(crate) struct Collection<T> {
    items: RwLock<Vec<T>>,
    loaded: AtomicBool,
}

impl<T: Resource> Collection<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.read().clone()
    }

    pub(crate) fn get(&self, id: &T::Id) -> Option<T> {
        self.read().iter().find(|item| item.id() == *id).cloned()
    }

    /// Merge raw records by id, in order.
    ///
    /// Known ids are updated in place; unknown ids go through `build` and
    /// are appended when it yields a node. Non-object records and records
    /// without an id are logged and skipped without aborting the batch.
    pub(crate) fn merge<F>(&self, records: Vec<Value>, mut build: F)
    where
        F: FnMut(Record) -> Option<T>,
    {
        if !records.is_empty() {
            self.loaded.store(true, Ordering::Release);
        }

        for value in records {
            let record = match value {
                Value::Object(record) => record,
                other => {
                    warn!(kind = T::KIND, record = %other, "API returned a non-object record");
                    continue;
                }
            };

            let Some(id) = T::record_id(&record) else {
                let record = Value::Object(record);
                warn!(
                    kind = T::KIND,
                    record = %record,
                    "API returned a record without an id"
                );
                continue;
            };

            // The lock is released before update/build: both recurse into
            // the node's own children.
            if let Some(existing) = self.get(&id) {
                existing.update(record);
            } else if let Some(node) = build(record) {
                self.write().push(node);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mutable attribute snapshot with typed field accessors.
pub(crate) struct Snapshot {
    data: RwLock<Record>,
}

impl Snapshot {
    pub(crate) fn new() -> Self {
        Self {
            data: RwLock::new(Record::new()),
        }
    }

    pub(crate) fn replace(&self, record: Record) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = record;
    }

    pub(crate) fn record(&self) -> Record {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn int(&self, field: &str) -> Option<i64> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .and_then(Value::as_i64)
    }

    pub(crate) fn string(&self, field: &str) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

/// Detach a nested child list from a record before it is stored.
///
/// `None` when the field is absent; a present but non-list field is
/// stripped and reported as an empty list.
pub(crate) fn take_children(record: &mut Record, field: &str) -> Option<Vec<Value>> {
    match record.remove(field)? {
        Value::Array(children) => Some(children),
        other => {
            warn!(field, value = %other, "expected a list of child records");
            Some(Vec::new())
        }
    }
}

/// Interpret a response body as a list of records.
///
/// Failed requests come back as `Value::Null`, which reads as no records.
pub(crate) fn records(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            warn!(value = %other, "expected a list of records");
            Vec::new()
        }
    }
}
