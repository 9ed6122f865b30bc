//! ActionKit's native event record and conversions to and from OSDI.

mod from_actionkit;
mod to_actionkit;

pub use from_actionkit::FromActionKit;
pub use to_actionkit::{OutboundContext, ToActionKit};

use osdi_core::EventStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute keys carrying this prefix are event fields, not event columns.
pub const FIELD_PREFIX: &str = "field_";

/// An event as returned by `GET /rest/v1/event/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AkEvent {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub max_attendees: Option<i64>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub public_description: Option<String>,
    #[serde(default)]
    pub directions: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_approved: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: AkStatus,
    /// User resource URI, e.g. `/rest/v1/user/42/`
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<EventField>,
}

/// One custom attribute of an event, addressable on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_uri: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AkStatus {
    #[default]
    Active,
    Cancelled,
    Deleted,
}

impl AkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AkStatus::Active => "active",
            AkStatus::Cancelled => "cancelled",
            AkStatus::Deleted => "deleted",
        }
    }

    /// Collapse ActionKit's `(status, is_approved)` pair into an OSDI status.
    pub fn to_osdi(self, is_approved: bool) -> EventStatus {
        match (self, is_approved) {
            (AkStatus::Cancelled | AkStatus::Deleted, true) => EventStatus::Cancelled,
            (AkStatus::Cancelled | AkStatus::Deleted, false) => EventStatus::Rejected,
            (AkStatus::Active, true) => EventStatus::Confirmed,
            (AkStatus::Active, false) => EventStatus::Tentative,
        }
    }

    /// Encode an OSDI status as `(status, is_approved)`.
    ///
    /// Lossy for `Rejected`: ActionKit has no fourth state, so it is sent as
    /// `cancelled` and reads back as `Rejected` only because it is unapproved.
    pub fn from_osdi(status: EventStatus) -> (AkStatus, bool) {
        match status {
            EventStatus::Confirmed => (AkStatus::Active, true),
            EventStatus::Tentative => (AkStatus::Active, false),
            EventStatus::Cancelled => (AkStatus::Deleted, true),
            EventStatus::Rejected => (AkStatus::Cancelled, false),
        }
    }
}

/// Event attributes ready to send to ActionKit.
///
/// Holds only keys with a value. Event-field values live under
/// `field_{name}` keys until the orchestrator splits them off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AkAttributes(Map<String, Value>);

impl AkAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` when `value` is present; absent values are never stored.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `(field name, value)` for every `field_`-prefixed key.
    pub fn field_entries(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix(FIELD_PREFIX)?;
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((name.to_string(), value))
            })
            .collect()
    }

    /// Everything except the `field_`-prefixed keys, as a request body.
    pub fn core(&self) -> Value {
        let core: Map<String, Value> = self
            .0
            .iter()
            .filter(|(key, _)| !key.starts_with(FIELD_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(core)
    }
}

/// A page of a listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AkList<T> {
    pub meta: AkListMeta,
    #[serde(default = "Vec::new")]
    pub objects: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AkListMeta {
    pub total_count: u64,
}

// A `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ActionKit sends ids as integers; accept strings too.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected id to be a number or string, got {other}"
        ))),
    }
}
