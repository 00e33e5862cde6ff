//! Invocation data exchanged with the hosting platform.
//!
//! An [`Invocation`] is the platform-neutral snapshot of one command use: either
//! a structured interaction (named options plus an optional subcommand), a
//! context-menu click (a target map), an autocomplete request (a focused option),
//! or a raw text message (`raw`). A [`Reply`] is what an action hands back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One command invocation as delivered by the platform adapter.
///
/// # Examples
///
/// ```
/// use slashkit::{Invocation, Value};
///
/// let invocation = Invocation::new("todo", "user-1")
///     .with_subcommand("add")
///     .with_option("text", Value::from("buy milk"));
/// assert_eq!(invocation.subcommand.as_deref(), Some("add"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Name of the invoked command
    pub command_name: String,
    /// Name of the invoked subcommand, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,
    /// Leaf option values keyed by option name
    #[serde(default)]
    pub options: HashMap<String, Value>,
    /// Context-menu target entries
    #[serde(default)]
    pub target: HashMap<String, Value>,
    /// Option currently being typed, for autocomplete requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<String>,
    /// Raw argument text, for text-command invocations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Invoking user
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

impl Invocation {
    /// Creates an invocation of `command_name` by `user_id` with no arguments.
    pub fn new(command_name: &str, user_id: &str) -> Self {
        Invocation {
            command_name: command_name.to_owned(),
            user_id: user_id.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_subcommand(mut self, subcommand: &str) -> Self {
        self.subcommand = Some(subcommand.to_owned());
        self
    }

    pub fn with_option(mut self, name: &str, value: Value) -> Self {
        self.options.insert(name.to_owned(), value);
        self
    }

    pub fn with_target(mut self, name: &str, value: Value) -> Self {
        self.target.insert(name.to_owned(), value);
        self
    }

    pub fn with_focused(mut self, name: &str) -> Self {
        self.focused = Some(name.to_owned());
        self
    }

    pub fn with_raw(mut self, raw: &str) -> Self {
        self.raw = Some(raw.to_owned());
        self
    }

    /// Returns the partially typed value of the focused option.
    pub fn focused_value(&self) -> Option<String> {
        let focused = self.focused.as_ref()?;
        self.options.get(focused).map(|value| value.to_string())
    }
}

/// Response produced by a command action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// A message visible to everyone in the channel
    Message(String),
    /// A message visible only to the invoking user
    Ephemeral(String),
    /// No response
    Silent,
}

impl Reply {
    pub fn message(content: impl Into<String>) -> Self {
        Reply::Message(content.into())
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Reply::Ephemeral(content.into())
    }

    /// Returns the reply text, `None` for [`Reply::Silent`].
    pub fn content(&self) -> Option<&str> {
        match self {
            Reply::Message(content) | Reply::Ephemeral(content) => Some(content),
            Reply::Silent => None,
        }
    }
}
