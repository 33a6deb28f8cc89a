//! Structured observations produced by the external UI driver.
//!
//! An `Observation` is untyped structured data, never raw markup. The core
//! only performs key-presence checks and reads a handful of conventional
//! keys, listed as constants below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the driver embeds the API response of the last action.
pub const API_RESPONSE_KEY: &str = "_api_response";

/// Key listing the observation fields a successful API response should surface.
pub const EXPECTED_UI_FIELDS_KEY: &str = "_expected_ui_fields";

/// Key holding the entity map (entity id to entity body).
pub const ENTITIES_KEY: &str = "entities";

/// A snapshot of the application's state as exposed by the driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(pub Map<String, Value>);

impl Observation {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build an observation from a JSON value. Non-object values yield an
    /// empty observation.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The embedded API response, when it is present and an object.
    pub fn api_response(&self) -> Option<&Map<String, Value>> {
        self.0.get(API_RESPONSE_KEY).and_then(Value::as_object)
    }

    /// Declared UI fields a successful API call should surface.
    ///
    /// Non-string entries are ignored; a missing key yields an empty list.
    pub fn expected_ui_fields(&self) -> Vec<&str> {
        self.0
            .get(EXPECTED_UI_FIELDS_KEY)
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The entity map, when present and an object.
    pub fn entities(&self) -> Option<&Map<String, Value>> {
        self.0.get(ENTITIES_KEY).and_then(Value::as_object)
    }

    /// Read `key` as a boolean flag; anything but `true` is false.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

impl From<Map<String, Value>> for Observation {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
