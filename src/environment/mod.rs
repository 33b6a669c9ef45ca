//! # Variables
//!
//! Named values carried across requests. A script reads and writes them
//! through a [`PropertyStore`], which remembers every name it touched so the
//! caller can persist only the changes.

use std::collections::{BTreeMap, HashMap};

use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    vars: BTreeMap<String, Value>,
    updated: Vec<String>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with variables inherited from earlier requests. Seeded
    /// names are not marked as updated.
    pub fn with_vars(globals: HashMap<String, Value>) -> Self {
        Self {
            vars: globals.into_iter().collect(),
            updated: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.mark_updated(&name);
        self.vars.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Remove `name`. It is recorded as updated even if it was absent.
    pub fn clear(&mut self, name: &str) {
        self.vars.remove(name);
        self.mark_updated(name);
    }

    pub fn clear_all(&mut self) {
        let names: Vec<String> = self.vars.keys().cloned().collect();
        for name in &names {
            self.mark_updated(name);
        }
        self.vars.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }

    /// Names touched since the store was created, in order of first touch.
    pub fn updated(&self) -> &[String] {
        &self.updated
    }

    fn mark_updated(&mut self, name: &str) {
        if !self.updated.iter().any(|existing| existing == name) {
            self.updated.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut store = PropertyStore::new();
        store.set("token", "abc123");

        assert_eq!(store.get("token"), Some(&Value::from("abc123")));
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.updated(), ["token"]);
    }

    #[test]
    fn updated_keeps_first_touch_order_without_duplicates() {
        let mut store = PropertyStore::new();
        store.set("x", 1);
        store.set("y", 2);
        store.clear("x");
        store.set("y", 3);

        assert_eq!(store.updated(), ["x", "y"]);
        assert_eq!(store.get("x"), None);
        assert_eq!(store.get("y"), Some(&Value::from(3)));
    }

    #[test]
    fn clear_of_absent_name_still_counts() {
        let mut store = PropertyStore::new();
        store.clear("ghost");

        assert!(store.is_empty());
        assert_eq!(store.updated(), ["ghost"]);
    }

    #[test]
    fn get_does_not_mark_updated() {
        let mut globals = HashMap::new();
        globals.insert("host".to_string(), Value::from("localhost"));
        let store = PropertyStore::with_vars(globals);

        assert_eq!(store.get("host"), Some(&Value::from("localhost")));
        assert!(store.updated().is_empty());
        assert!(!store.is_empty());
    }

    #[test]
    fn clear_all_marks_every_present_name() {
        let mut globals = HashMap::new();
        globals.insert("a".to_string(), Value::from(1));
        globals.insert("b".to_string(), Value::from(2));
        let mut store = PropertyStore::with_vars(globals);
        store.set("c", 3);

        store.clear_all();

        assert!(store.is_empty());
        assert_eq!(store.updated(), ["c", "a", "b"]);
    }
}
