use serde_json::Value as JsonValue;

use crate::{AdtechmediaClient, OptionStore, PropertyBuild};

pub const API_KEY: &str = "key";
pub const PROPERTY_ID: &str = "Id";
pub const BUILD_PATH: &str = "BuildPath";

/// Plugin state persisted between admin actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginSettings {
    pub api_key: Option<String>,
    pub property_id: Option<String>,
    pub build_path: Option<String>,
}

impl PluginSettings {
    /// Reads settings from `store`. Non-string or empty values count as unset.
    pub fn load(store: &impl OptionStore) -> Self {
        Self {
            api_key: read_string(store, API_KEY),
            property_id: read_string(store, PROPERTY_ID),
            build_path: read_string(store, BUILD_PATH),
        }
    }

    /// Writes set members to `store` and removes unset ones.
    pub fn save(&self, store: &mut impl OptionStore) {
        write_string(store, API_KEY, self.api_key.as_deref());
        write_string(store, PROPERTY_ID, self.property_id.as_deref());
        write_string(store, BUILD_PATH, self.build_path.as_deref());
    }

    /// Removes every setting from `store`.
    pub fn clear(store: &mut impl OptionStore) {
        for key in [API_KEY, PROPERTY_ID, BUILD_PATH] {
            store.delete(key);
        }
    }

    /// Records the identifiers returned by a property create/update call.
    pub fn apply_build(&mut self, build: PropertyBuild) {
        self.property_id = Some(build.id);
        self.build_path = Some(build.build_path);
    }

    /// Builds an API client for `end_point` using the stored API key.
    pub fn client(&self, end_point: impl Into<String>) -> AdtechmediaClient {
        let client = AdtechmediaClient::new(end_point);
        match &self.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        }
    }
}

fn read_string(store: &impl OptionStore, key: &str) -> Option<String> {
    match store.get(key) {
        Some(JsonValue::String(value)) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn write_string(store: &mut impl OptionStore, key: &str, value: Option<&str>) {
    match value {
        Some(value) => store.set(key, JsonValue::String(value.to_owned())),
        None => {
            store.delete(key);
        }
    }
}
