//! The argument object handed to command actions.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, json};

use crate::{resolve::Resolution, value::Value};

/// Resolved arguments of one invocation, keyed by name.
///
/// Flags are kept apart as a set: a present flag is recorded under its name, its
/// short token and the value it carried, so any of them can be checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, Value>,
    flags: BTreeSet<String>,
    subcommand: Option<String>,
}

impl Arguments {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let values = resolution
            .args
            .iter()
            .filter_map(|arg| Some((arg.name.clone(), arg.value.clone()?)))
            .collect();

        let mut flags = BTreeSet::new();
        for flag in resolution.flags.iter().filter(|flag| flag.is_present()) {
            flags.insert(flag.name.clone());
            if let Some(token) = &flag.flag {
                flags.insert(token.clone());
            }
            if let Some(value) = &flag.value {
                flags.insert(value.to_string());
            }
        }

        Arguments {
            values,
            flags,
            subcommand: resolution.subcommand.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns a variadic argument; a single value reads as a one-item list.
    pub fn get_list(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name)? {
            Value::List(items) => Some(items.clone()),
            value => Some(vec![value.to_string()]),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns `true` when a flag was given, checked by name, token or value.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    /// Renders the arguments as one JSON object, flags under the reserved
    /// `flags` key and the subcommand under `subcommand`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = Map::new();
        for (name, value) in &self.values {
            object.insert(name.clone(), json!(value));
        }

        let flags: Map<String, serde_json::Value> = self
            .flags
            .iter()
            .map(|flag| (flag.clone(), serde_json::Value::Bool(true)))
            .collect();
        object.insert("flags".to_owned(), serde_json::Value::Object(flags));
        object.insert("subcommand".to_owned(), json!(self.subcommand));

        serde_json::Value::Object(object)
    }
}
