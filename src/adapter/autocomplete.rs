//! Registry of autocomplete callbacks.
//!
//! Callbacks are published once per command when it is registered and read on
//! every autocomplete request.

use std::{collections::HashMap, sync::Arc};

use log::debug;
use tokio::sync::RwLock;

use crate::command::{AutocompleteFn, CommandSpec, ScopeKey};

/// Autocomplete callbacks keyed by command name, then by scope key.
///
/// Cloning the registry shares the underlying map.
#[derive(Clone, Default)]
pub struct AutocompleteRegistry {
    callbacks: Arc<RwLock<HashMap<String, HashMap<ScopeKey, AutocompleteFn>>>>,
}

impl AutocompleteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the autocomplete callbacks of a command, replacing any earlier
    /// ones for the same command name. Commands without callbacks are skipped.
    pub async fn publish(&self, spec: &CommandSpec) {
        if spec.autocomplete.is_empty() {
            return;
        }

        debug!(
            "publishing {} autocomplete callbacks for `{}`",
            spec.autocomplete.len(),
            spec.name
        );
        self.callbacks
            .write()
            .await
            .insert(spec.name.clone(), spec.autocomplete.clone());
    }

    /// Returns the callback of one argument.
    pub async fn callback(&self, command_name: &str, key: &ScopeKey) -> Option<AutocompleteFn> {
        self.callbacks
            .read()
            .await
            .get(command_name)
            .and_then(|callbacks| callbacks.get(key))
            .cloned()
    }

    pub async fn contains(&self, command_name: &str) -> bool {
        self.callbacks.read().await.contains_key(command_name)
    }
}
