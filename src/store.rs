//! Key-value option storage.
//!
//! Callers receive a store explicitly instead of reading ambient global
//! state. Namespacing is the job of [`PrefixedStore`], not of the code that
//! reads and writes options.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// Persistent string-keyed option storage.
pub trait OptionStore {
    fn get(&self, key: &str) -> Option<JsonValue>;

    fn set(&mut self, key: &str, value: JsonValue);

    /// Removes `key`, returning whether it was present.
    fn delete(&mut self, key: &str) -> bool;

    /// Returns the stored value or `default` when the key is unset.
    ///
    /// Stored falsy values such as `""`, `0` or `false` are returned as is.
    fn get_or(&self, key: &str, default: JsonValue) -> JsonValue {
        self.get(key).unwrap_or(default)
    }

    /// Stores `value` only when `key` is unset. Returns whether it was written.
    fn add(&mut self, key: &str, value: JsonValue) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.set(key, value);
        true
    }
}

/// In-memory [`OptionStore`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    values: HashMap<String, JsonValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        self.values.insert(key.to_owned(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

/// Adapter that scopes every key of an inner store under a prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefixedStore<S> {
    inner: S,
    prefix: String,
}

impl<S: OptionStore> PrefixedStore<S> {
    pub fn new(inner: S, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    pub fn prefix_str(&self) -> &str {
        &self.prefix
    }

    /// Prefixed form of `name`. Already prefixed names are returned unchanged.
    pub fn prefix(&self, name: &str) -> String {
        if name.starts_with(&self.prefix) {
            name.to_owned()
        } else {
            format!("{}{name}", self.prefix)
        }
    }

    /// `name` without the prefix; names without it are returned unchanged.
    pub fn unprefix<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.prefix.as_str()).unwrap_or(name)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: OptionStore> OptionStore for PrefixedStore<S> {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.inner.get(&self.prefix(key))
    }

    fn set(&mut self, key: &str, value: JsonValue) {
        let key = self.prefix(key);
        self.inner.set(&key, value);
    }

    fn delete(&mut self, key: &str) -> bool {
        let key = self.prefix(key);
        self.inner.delete(&key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{MemoryStore, OptionStore, PrefixedStore};

    #[test]
    fn memory_store_crud() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("price", json!(5));
        assert_eq!(store.get("price"), Some(json!(5)));
        assert_eq!(store.get_or("missing", json!("fallback")), json!("fallback"));
        assert!(store.delete("price"));
        assert!(!store.delete("price"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn add_keeps_existing_values() {
        let mut store = PrefixedStore::new(MemoryStore::new(), "atm_");
        assert!(store.add("price", json!(5)));
        assert!(!store.add("price", json!(9)));
        assert_eq!(store.get("price"), Some(json!(5)));
        assert_eq!(store.inner().get("atm_price"), Some(json!(5)));

        store.set("flag", json!(false));
        assert_eq!(store.get_or("flag", json!(true)), json!(false));
    }

    #[test]
    fn prefix_is_idempotent_and_reversible() {
        let store = PrefixedStore::new(MemoryStore::new(), "Adtechmedia_Plugin_");
        assert_eq!(store.prefix("key"), "Adtechmedia_Plugin_key");
        assert_eq!(store.prefix("Adtechmedia_Plugin_key"), "Adtechmedia_Plugin_key");
        assert_eq!(store.unprefix("Adtechmedia_Plugin_key"), "key");
        assert_eq!(store.unprefix("other"), "other");
    }

    #[test]
    fn prefixed_store_namespaces_inner_keys() {
        let mut store = PrefixedStore::new(MemoryStore::new(), "atm_");
        store.set("api_key", json!("k"));
        assert_eq!(store.get("api_key"), Some(json!("k")));
        assert_eq!(store.get("atm_api_key"), Some(json!("k")));
        assert_eq!(store.inner().keys().collect::<Vec<_>>(), vec!["atm_api_key"]);
        assert_eq!(store.inner().get("api_key"), None);

        assert!(store.delete("api_key"));
        assert!(store.into_inner().is_empty());
    }
}
