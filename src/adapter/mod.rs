//! Glue between built commands and a hosting chat platform.
//!
//! # Overview
//!
//! The adapter turns a frozen [`CommandSpec`](crate::command::CommandSpec) into a
//! registration payload, hands it to a [`Platform`], and routes every incoming
//! invocation back to the command's action:
//!
//! ```text
//! register(spec) ──► CommandSchema ──► Platform::register_command
//!        │
//!        └─► AutocompleteRegistry::publish
//!
//! Invocation ──► Dispatcher::dispatch ──► resolve ──► action ──► Platform::respond
//!      │
//!      └── focused ──► Dispatcher::autocomplete ──► Platform::respond_autocomplete
//! ```
//!
//! Text messages go through [`Dispatcher::handle_message`], which strips the
//! prefix, answers `help` and ignores everything not addressed to the bot.
//!
//! # Module Organization
//!
//! - `autocomplete` - shared registry of autocomplete callbacks
//! - `dispatcher` - registration and routing
//! - `platform` - the [`Platform`] trait and its mock
//! - `responses` - markdown replies produced by the dispatcher itself
//! - `schema` - the serializable registration payload

use thiserror::Error;

mod autocomplete;
mod dispatcher;
mod platform;
mod responses;
mod schema;

pub use crate::adapter::autocomplete::AutocompleteRegistry;
pub use crate::adapter::dispatcher::Dispatcher;
pub use crate::adapter::platform::{MockPlatform, Platform};
pub use crate::adapter::responses::{
    format_dispatch_failure, format_help, format_not_available, format_unknown_command,
};
pub use crate::adapter::schema::{ChoiceSchema, CommandSchema, OptionKind, OptionSchema};

/// Errors that can occur while parsing a text message into an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    /// The message doesn't start with the command prefix
    #[error("message not addressed to the bot")]
    NotForBot,
    /// The message names a command that is not registered
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}
