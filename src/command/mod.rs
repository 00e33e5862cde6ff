//! Command declaration: the structural model and the builder compiling it.
//!
//! # Overview
//!
//! A command is declared either through the fluent [`SyntaxCommand`] API or from a
//! single whole-command syntax string. Either way a [`SyntaxBuilder`] accumulates
//! the declaration and freezes it into an immutable [`CommandSpec`] on `build()`.
//!
//! ```text
//! command("todo", "Manage todos")
//!      │  .subcommand(..) / .argument(..) / .require(..) / ...
//!      ▼
//! ┌───────────────┐   build()   ┌──────────────────┐
//! │ SyntaxBuilder │ ──────────► │ Arc<CommandSpec> │
//! └───────────────┘             └──────────────────┘
//! ```
//!
//! # Errors
//!
//! Every declaration error is a [`BuildError`], raised at the offending call so
//! that broken declarations fail at startup rather than at dispatch.
//!
//! # Module Organization
//!
//! - `argument` - parameters, datatypes, scope keys and requirements
//! - `builder` - the order-sensitive [`SyntaxBuilder`] state machine
//! - `fluent` - the chaining [`SyntaxCommand`] and [`SyntaxContextMenu`] wrappers
//! - `permissions` - known permission identifiers
//! - `spec` - the frozen [`CommandSpec`] and callback types

use thiserror::Error;

use crate::syntax::SyntaxError;

mod argument;
mod builder;
mod fluent;
mod permissions;
mod spec;

pub use crate::command::argument::{
    Argument, ArgumentKind, CommandRole, CommandType, DataType, Requirement, ScopeKey,
};
pub use crate::command::builder::{FILLER_DESCRIPTION, SyntaxBuilder};
pub use crate::command::fluent::{
    FinalizedCommand, SyntaxCommand, SyntaxContextMenu, command, context_menu, syntax_command,
};
pub use crate::command::permissions::{KNOWN_PERMISSIONS, is_permission};
pub use crate::command::spec::{
    ActionFn, ActionFuture, ArgumentOptions, AutocompleteFn, AutocompleteFuture, ChoiceSource,
    CommandSpec, action_fn, autocomplete_fn,
};

/// Errors raised while declaring a command.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A syntax string violates the fragment grammar
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// The command name or description was set twice
    #[error("{0} already set")]
    AlreadySet(&'static str),
    /// A mutator was called before the command was named
    #[error("cannot {0} before the command is named")]
    PrematureCall(&'static str),
    /// A numeric bound was set on a non-numeric argument, or `min > max`
    #[error("invalid constraint on argument `{argument}`: {reason}")]
    InvalidConstraint { argument: String, reason: String },
    /// Two arguments share a name within the same scope
    #[error("argument `{0}` is already declared")]
    DuplicateArgument(ScopeKey),
    /// Literal choices and autocomplete were both requested for one argument
    #[error("argument `{0}` cannot combine literal choices with autocomplete")]
    ConflictingChoiceSource(ScopeKey),
    /// A context menu type other than `user` or `message`
    #[error("invalid context menu type `{0}`, expected `user` or `message`")]
    InvalidMenuType(String),
    /// The builder was already frozen by `build()`
    #[error("the command was already built")]
    Finalized,
}
