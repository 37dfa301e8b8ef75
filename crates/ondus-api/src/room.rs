// ── Room node ──

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::appliance::Appliance;
use crate::client::ApiClient;
use crate::tree::{Collection, Record, Resource, Snapshot, records, take_children};

/// A room inside a location and its lazily loaded appliances.
///
/// Keeps the owning location's id only to build request paths.
#[derive(Clone)]
pub struct Room {
    inner: Arc<RoomInner>,
}

struct RoomInner {
    client: Arc<ApiClient>,
    location_id: i64,
    data: Snapshot,
    appliances: Collection<Appliance>,
}

impl Room {
    pub(crate) fn new(client: Arc<ApiClient>, location_id: i64, record: Record) -> Self {
        let room = Self {
            inner: Arc::new(RoomInner {
                client,
                location_id,
                data: Snapshot::new(),
                appliances: Collection::new(),
            }),
        };
        room.update(record);
        room
    }

    /// Id unique within the owning location, `-1` if absent.
    pub fn id(&self) -> i64 {
        self.inner.data.int("id").unwrap_or(-1)
    }

    pub fn location_id(&self) -> i64 {
        self.inner.location_id
    }

    pub fn name(&self) -> String {
        self.inner.data.string("name").unwrap_or_default()
    }

    /// Room role; numeric roles are rendered as their decimal text.
    pub fn role(&self) -> String {
        self.inner
            .data
            .string("role")
            .or_else(|| self.inner.data.int("role").map(|role| role.to_string()))
            .unwrap_or_default()
    }

    pub fn room_type(&self) -> i64 {
        self.inner.data.int("room_type").unwrap_or(-1)
    }

    pub fn kind(&self) -> i64 {
        self.inner.data.int("type").unwrap_or(-1)
    }

    /// Current attribute snapshot, without the nested `appliances` list.
    pub fn data(&self) -> Record {
        self.inner.data.record()
    }

    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Look up an already loaded appliance. Never fetches.
    pub fn appliance(&self, id: &str) -> Option<Appliance> {
        self.inner.appliances.get(&id.to_owned())
    }

    /// Appliances of this room, fetched from
    /// `locations/{loc}/rooms/{id}/appliances` until a non-empty list has
    /// been seen. Unsupported appliances count towards that list.
    pub async fn appliances(&self) -> Vec<Appliance> {
        if !self.inner.appliances.is_loaded() {
            let path = format!(
                "locations/{}/rooms/{}/appliances",
                self.inner.location_id,
                self.id()
            );
            let response = self.inner.client.request(&path, None, Method::GET).await;
            self.merge_appliances(records(response));
        }
        self.inner.appliances.snapshot()
    }

    /// Replace the attribute snapshot and merge any embedded `appliances`.
    pub fn update(&self, mut record: Record) {
        let appliances = take_children(&mut record, "appliances");
        self.inner.data.replace(record);
        if let Some(appliances) = appliances {
            self.merge_appliances(appliances);
        }
    }

    fn merge_appliances(&self, appliances: Vec<Value>) {
        let location_id = self.inner.location_id;
        let room_id = self.id();
        let client = &self.inner.client;
        self.inner.appliances.merge(appliances, |record| {
            Appliance::from_record(Arc::clone(client), location_id, room_id, record)
        });
    }
}

impl Resource for Room {
    type Id = i64;
    const KIND: &'static str = "room";

    fn id(&self) -> i64 {
        Room::id(self)
    }

    fn record_id(record: &Record) -> Option<i64> {
        record.get("id").and_then(Value::as_i64)
    }

    fn update(&self, record: Record) {
        Room::update(self, record);
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("location_id", &self.inner.location_id)
            .field("id", &self.id())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::appliance::ApplianceType;
    use crate::testing::{ScriptedTransport, authed_client};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(record) => record,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn attributes_fall_back_to_defaults() {
        let transport = ScriptedTransport::offline();
        let room = Room::new(authed_client(&transport), 1, record(json!({"id": 3})));

        assert_eq!(room.name(), "");
        assert_eq!(room.role(), "");
        assert_eq!(room.room_type(), -1);
        assert_eq!(room.kind(), -1);
    }

    #[test]
    fn role_accepts_text_or_number() {
        let transport = ScriptedTransport::offline();
        let client = authed_client(&transport);

        let room = Room::new(Arc::clone(&client), 1, record(json!({"id": 3, "role": "owner"})));
        assert_eq!(room.role(), "owner");

        let room = Room::new(client, 1, record(json!({"id": 4, "role": 2})));
        assert_eq!(room.role(), "2");
    }

    #[test]
    fn embedded_appliances_skip_unknown_types_and_missing_ids() {
        let transport = ScriptedTransport::offline();
        let room = Room::new(
            authed_client(&transport),
            1,
            record(json!({
                "id": 3,
                "appliances": [
                    {"appliance_id": "a", "type": 101},
                    {"appliance_id": "b", "type": 999},
                    {"type": 103},
                    {"appliance_id": "c", "type": 104}
                ]
            })),
        );

        assert!(!room.data().contains_key("appliances"));
        assert_eq!(room.appliance("a").unwrap().appliance_type(), ApplianceType::Sense);
        assert!(room.appliance("b").is_none());
        assert!(room.appliance("c").unwrap().as_blue_home().is_some());
    }

    #[tokio::test]
    async fn update_with_embedded_appliances_short_circuits_fetch() {
        let transport = ScriptedTransport::offline();
        let room = Room::new(authed_client(&transport), 1, record(json!({"id": 3})));

        room.update(record(json!({"id": 3, "appliances": [{"appliance_id": "x", "type": 103}]})));
        let appliances = room.appliances().await;

        assert_eq!(appliances.len(), 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn unsupported_only_room_is_fetched_once() {
        let transport = ScriptedTransport::new([(200, r#"[{"appliance_id": "old", "type": 0}]"#)]);
        let room = Room::new(authed_client(&transport), 1, record(json!({"id": 3})));

        for _ in 0..3 {
            assert!(room.appliances().await.is_empty());
        }

        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_on_next_call() {
        let transport = ScriptedTransport::new([
            (500, "boom"),
            (200, r#"[{"appliance_id": "x", "type": 103}]"#),
        ]);
        let room = Room::new(authed_client(&transport), 1, record(json!({"id": 3})));

        assert!(room.appliances().await.is_empty());
        assert_eq!(room.appliances().await.len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn appliances_fetch_uses_scoped_path() {
        let transport = ScriptedTransport::new([(200, r#"[{"appliance_id": "x", "type": 101}]"#)]);
        let room = Room::new(authed_client(&transport), 4, record(json!({"id": 9})));

        let appliances = room.appliances().await;

        assert_eq!(appliances.len(), 1);
        assert_eq!(appliances[0].core().room_id(), 9);
        assert_eq!(
            transport.requests()[0].url.path(),
            "/v3/iot/locations/4/rooms/9/appliances"
        );
    }
}
