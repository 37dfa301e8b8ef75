// ── Location node ──

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::client::ApiClient;
use crate::room::Room;
use crate::tree::{Collection, Record, Resource, Snapshot, records, take_children};

/// A location (home) and its lazily loaded rooms.
///
/// Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Location {
    inner: Arc<LocationInner>,
}

struct LocationInner {
    client: Arc<ApiClient>,
    data: Snapshot,
    rooms: Collection<Room>,
}

impl Location {
    pub(crate) fn new(client: Arc<ApiClient>, record: Record) -> Self {
        let location = Self {
            inner: Arc::new(LocationInner {
                client,
                data: Snapshot::new(),
                rooms: Collection::new(),
            }),
        };
        location.update(record);
        location
    }

    /// Server-assigned id, `-1` if the snapshot has none.
    pub fn id(&self) -> i64 {
        self.inner.data.int("id").unwrap_or(-1)
    }

    pub fn name(&self) -> String {
        self.inner.data.string("name").unwrap_or_default()
    }

    /// Current attribute snapshot, without the nested `rooms` list.
    pub fn data(&self) -> Record {
        self.inner.data.record()
    }

    /// Whether both handles refer to the same node.
    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Look up an already loaded room. Never fetches.
    pub fn room(&self, id: i64) -> Option<Room> {
        self.inner.rooms.get(&id)
    }

    /// Rooms of this location, fetched from `locations/{id}/rooms` until a
    /// non-empty list has been seen.
    pub async fn rooms(&self) -> Vec<Room> {
        if !self.inner.rooms.is_loaded() {
            let path = format!("locations/{}/rooms", self.id());
            let response = self.inner.client.request(&path, None, Method::GET).await;
            self.merge_rooms(records(response));
        }
        self.inner.rooms.snapshot()
    }

    /// Replace the attribute snapshot and merge any embedded `rooms`.
    pub fn update(&self, mut record: Record) {
        let rooms = take_children(&mut record, "rooms");
        self.inner.data.replace(record);
        if let Some(rooms) = rooms {
            self.merge_rooms(rooms);
        }
    }

    fn merge_rooms(&self, rooms: Vec<Value>) {
        let location_id = self.id();
        let client = &self.inner.client;
        self.inner.rooms.merge(rooms, |record| {
            Some(Room::new(Arc::clone(client), location_id, record))
        });
    }
}

impl Resource for Location {
    type Id = i64;
    const KIND: &'static str = "location";

    fn id(&self) -> i64 {
        Location::id(self)
    }

    fn record_id(record: &Record) -> Option<i64> {
        record.get("id").and_then(Value::as_i64)
    }

    fn update(&self, record: Record) {
        Location::update(self, record);
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
