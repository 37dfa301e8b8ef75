// ── Appliance registry and variants ──
//
// The server tags every appliance record with a numeric type code. Known
// codes map to a concrete variant; anything else is not represented in
// the tree at all.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use strum::{Display, FromRepr};
use tracing::debug;

use crate::client::ApiClient;
use crate::tree::{Record, Resource, Snapshot};

/// Appliance type code as reported in the record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum ApplianceType {
    /// Unknown or unsupported appliance.
    Unsupported = 0,
    /// Battery powered water detector.
    Sense = 101,
    /// Water guard installed on the supply pipe.
    SenseGuard = 103,
    /// Chilled/carbonated water tap.
    BlueHome = 104,
}

impl ApplianceType {
    /// Coerce a raw code; unrecognized codes become [`Unsupported`](Self::Unsupported).
    pub fn from_code(code: i64) -> Self {
        u16::try_from(code)
            .ok()
            .and_then(Self::from_repr)
            .unwrap_or(Self::Unsupported)
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Unsupported => 0,
            Self::Sense => 101,
            Self::SenseGuard => 103,
            Self::BlueHome => 104,
        }
    }

    fn of(record: &Record) -> Self {
        record
            .get("type")
            .and_then(Value::as_i64)
            .map_or(Self::Unsupported, Self::from_code)
    }
}

/// Water selection for [`BlueHomeTap::open_water`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum WaterType {
    Still,
    Carbonated,
}

impl WaterType {
    pub fn code(self) -> u8 {
        match self {
            Self::Still => 1,
            Self::Carbonated => 2,
        }
    }
}

// ── Shared appliance state ──────────────────────────────────────────

/// State and operations common to every appliance variant.
///
/// Cloning yields another handle to the same appliance.
#[derive(Clone)]
pub struct ApplianceCore {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    client: Arc<ApiClient>,
    location_id: i64,
    room_id: i64,
    data: Snapshot,
}

impl ApplianceCore {
    fn new(client: Arc<ApiClient>, location_id: i64, room_id: i64, record: Record) -> Self {
        let core = Self {
            inner: Arc::new(CoreInner {
                client,
                location_id,
                room_id,
                data: Snapshot::new(),
            }),
        };
        core.update(record);
        core
    }

    /// Globally unique appliance id (`appliance_id`), empty if absent.
    pub fn id(&self) -> String {
        self.inner.data.string("appliance_id").unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.inner.data.string("name").unwrap_or_default()
    }

    /// Type code from the current snapshot, coerced to a known tag.
    pub fn appliance_type(&self) -> ApplianceType {
        ApplianceType::of(&self.inner.data.record())
    }

    pub fn location_id(&self) -> i64 {
        self.inner.location_id
    }

    pub fn room_id(&self) -> i64 {
        self.inner.room_id
    }

    pub fn data(&self) -> Record {
        self.inner.data.record()
    }

    pub fn update(&self, record: Record) {
        self.inner.data.replace(record);
    }

    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// POST a command payload to this appliance and return the decoded
    /// response, `Value::Null` on failure.
    pub async fn command(&self, payload: &Value) -> Value {
        let path = format!(
            "locations/{}/rooms/{}/appliances/{}/command",
            self.inner.location_id,
            self.inner.room_id,
            self.id()
        );
        debug!(appliance = %self.id(), "sending command");
        self.inner
            .client
            .request(&path, Some(payload), Method::POST)
            .await
    }
}

impl fmt::Debug for ApplianceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplianceCore")
            .field("id", &self.id())
            .field("type", &self.appliance_type())
            .field("location_id", &self.inner.location_id)
            .field("room_id", &self.inner.room_id)
            .finish_non_exhaustive()
    }
}

// ── Variants ────────────────────────────────────────────────────────

/// GROHE Sense battery powered water detector.
#[derive(Debug, Clone)]
pub struct SenseSensor {
    core: ApplianceCore,
}

/// GROHE Sense Guard valve.
#[derive(Debug, Clone)]
pub struct SenseGuardValve {
    core: ApplianceCore,
}

/// GROHE Blue Home dispensing tap.
#[derive(Debug, Clone)]
pub struct BlueHomeTap {
    core: ApplianceCore,
}

impl SenseSensor {
    pub fn core(&self) -> &ApplianceCore {
        &self.core
    }
}

impl SenseGuardValve {
    pub fn core(&self) -> &ApplianceCore {
        &self.core
    }
}

impl BlueHomeTap {
    pub fn core(&self) -> &ApplianceCore {
        &self.core
    }

    /// Dispense `amount_ml` millilitres of the given water type.
    pub async fn open_water(&self, water: WaterType, amount_ml: u32) -> Value {
        let payload = json!({
            "command": {
                "tap_type": water.code(),
                "tap_amount": amount_ml,
            }
        });
        self.core.command(&payload).await
    }
}

/// An appliance of a supported type.
#[derive(Debug, Clone)]
pub enum Appliance {
    Sense(SenseSensor),
    SenseGuard(SenseGuardValve),
    BlueHome(BlueHomeTap),
}

impl Appliance {
    /// Build the variant matching the record's type code.
    ///
    /// Returns `None` for unsupported codes, so such appliances never
    /// enter the tree.
    pub(crate) fn from_record(
        client: Arc<ApiClient>,
        location_id: i64,
        room_id: i64,
        record: Record,
    ) -> Option<Self> {
        let kind = ApplianceType::of(&record);
        let core = || ApplianceCore::new(client, location_id, room_id, record);

        match kind {
            ApplianceType::Sense => Some(Self::Sense(SenseSensor { core: core() })),
            ApplianceType::SenseGuard => Some(Self::SenseGuard(SenseGuardValve { core: core() })),
            ApplianceType::BlueHome => Some(Self::BlueHome(BlueHomeTap { core: core() })),
            ApplianceType::Unsupported => {
                debug!(location_id, room_id, "skipping unsupported appliance type");
                None
            }
        }
    }

    pub fn core(&self) -> &ApplianceCore {
        match self {
            Self::Sense(sensor) => &sensor.core,
            Self::SenseGuard(valve) => &valve.core,
            Self::BlueHome(tap) => &tap.core,
        }
    }

    pub fn id(&self) -> String {
        self.core().id()
    }

    pub fn name(&self) -> String {
        self.core().name()
    }

    pub fn appliance_type(&self) -> ApplianceType {
        self.core().appliance_type()
    }

    pub fn data(&self) -> Record {
        self.core().data()
    }

    pub fn same_node(&self, other: &Self) -> bool {
        self.core().same_node(other.core())
    }

    pub async fn command(&self, payload: &Value) -> Value {
        self.core().command(payload).await
    }

    pub fn as_sense(&self) -> Option<&SenseSensor> {
        match self {
            Self::Sense(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub fn as_sense_guard(&self) -> Option<&SenseGuardValve> {
        match self {
            Self::SenseGuard(valve) => Some(valve),
            _ => None,
        }
    }

    pub fn as_blue_home(&self) -> Option<&BlueHomeTap> {
        match self {
            Self::BlueHome(tap) => Some(tap),
            _ => None,
        }
    }
}

impl Resource for Appliance {
    type Id = String;
    const KIND: &'static str = "appliance";

    fn id(&self) -> String {
        self.core().id()
    }

    fn record_id(record: &Record) -> Option<String> {
        record
            .get("appliance_id")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn update(&self, record: Record) {
        self.core().update(record);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, authed_client};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(record) => record,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn unknown_codes_coerce_to_unsupported() {
        for code in [-1, 0, 1, 100, 102, 105, 65_536, i64::MAX] {
            assert_eq!(ApplianceType::from_code(code), ApplianceType::Unsupported, "{code}");
        }
        assert_eq!(ApplianceType::from_code(101), ApplianceType::Sense);
        assert_eq!(ApplianceType::from_code(103), ApplianceType::SenseGuard);
        assert_eq!(ApplianceType::from_code(104), ApplianceType::BlueHome);
        assert_eq!(ApplianceType::BlueHome.code(), 104);
        assert_eq!(ApplianceType::SenseGuard.to_string(), "SENSE_GUARD");
    }

    #[test]
    fn factory_declines_unsupported_codes() {
        let transport = ScriptedTransport::offline();
        for raw in [json!(0), json!(42), json!("104"), Value::Null] {
            let built = Appliance::from_record(
                authed_client(&transport),
                1,
                2,
                record(json!({"appliance_id": "x", "type": raw})),
            );
            assert!(built.is_none());
        }
    }

    #[test]
    fn factory_picks_variant_by_code() {
        let transport = ScriptedTransport::offline();
        let build = |code: i64| {
            Appliance::from_record(
                authed_client(&transport),
                1,
                2,
                record(json!({"appliance_id": "x", "type": code})),
            )
            .unwrap()
        };

        assert!(build(101).as_sense().is_some());
        assert!(build(103).as_sense_guard().is_some());
        assert!(build(104).as_blue_home().is_some());
        assert!(build(101).as_blue_home().is_none());
    }

    #[test]
    fn type_accessor_coerces_after_update() {
        let transport = ScriptedTransport::offline();
        let appliance = Appliance::from_record(
            authed_client(&transport),
            1,
            2,
            record(json!({"appliance_id": "x", "type": 101})),
        )
        .unwrap();

        appliance.core().update(record(json!({"appliance_id": "x", "type": 7})));

        assert_eq!(appliance.appliance_type(), ApplianceType::Unsupported);
        assert!(appliance.as_sense().is_some());
    }

    #[tokio::test]
    async fn open_water_posts_tap_command() {
        let transport = ScriptedTransport::new([(200, r#"{"status":"ok"}"#)]);
        let appliance = Appliance::from_record(
            authed_client(&transport),
            5,
            6,
            record(json!({"appliance_id": "tap-1", "type": 104})),
        )
        .unwrap();

        let tap = appliance.as_blue_home().unwrap();
        let response = tap.open_water(WaterType::Carbonated, 250).await;

        assert_eq!(response, json!({"status": "ok"}));
        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(
            sent[0].url.path(),
            "/v3/iot/locations/5/rooms/6/appliances/tap-1/command"
        );
        assert_eq!(
            sent[0].body,
            Some(json!({"command": {"tap_type": 2, "tap_amount": 250}}))
        );
    }
}
