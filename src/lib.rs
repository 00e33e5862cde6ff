//! Slashkit - a command-syntax compiler and argument resolver for chat-bot slash
//! commands.
//!
//! Bot authors declare commands with a compact syntax mini-language; slashkit
//! compiles the declarations into an immutable command model, produces the
//! registration payload a slash-command platform expects, and maps every live
//! invocation back onto a name-keyed argument object for the command's action.
//!
//! # Overview
//!
//! ```text
//! "add <item; Item to add>"
//!      │
//!      ▼
//! ┌────────┐  fragments  ┌─────────┐  build()  ┌─────────────┐
//! │ syntax │ ──────────► │ command │ ────────► │ CommandSpec │
//! └────────┘             └─────────┘           └─────────────┘
//!                                                │         │
//!                                   CommandSchema│         │ resolve(Invocation)
//!                                                ▼         ▼
//!                                         ┌──────────┐  ┌───────────┐
//!                                         │ Platform │  │ Arguments │ ──► action
//!                                         └──────────┘  └───────────┘
//! ```
//!
//! # Features
//!
//! - **Syntax strings**: required, optional, variadic, typed and flag parameters
//!   with descriptions and literal choices in one line
//! - **Subcommands**: declared explicitly or created on first use
//! - **Restrictions**: permissions, roles, channels and guilds
//! - **Autocomplete**: async callbacks scoped per subcommand
//! - **Three resolution strategies**: structured interactions, raw text messages
//!   and context-menu clicks share one output shape
//!
//! # Examples
//!
//! ```
//! use slashkit::{Invocation, Reply, Value, command, resolve::resolve};
//!
//! let todo = command("todo", "Manage todos")?
//!     .argument("add <item...; Item to add>", None)?
//!     .argument("list (-a all)", "Show done items too")?
//!     .action(|_, arguments, _| async move {
//!         Ok(Reply::message(format!("{:?}", arguments.get_list("item"))))
//!     })?;
//!
//! let invocation = Invocation::new("todo", "user-1").with_raw("add buy milk");
//! let resolution = resolve(todo.spec(), &invocation).unwrap();
//! assert_eq!(resolution.subcommand.as_deref(), Some("add"));
//! assert_eq!(
//!     resolution.arg("item").and_then(|arg| arg.value.clone()),
//!     Some(Value::List(vec!["buy".into(), "milk".into()]))
//! );
//! # Ok::<(), slashkit::BuildError>(())
//! ```
//!
//! # Modules
//!
//! - [`syntax`] - fragment tokenizer and payload grammar
//! - [`command`] - command model, builder and fluent declaration API
//! - [`resolve`] - argument resolution strategies and the [`Arguments`] object
//! - [`adapter`] - registration schema, platform seam and dispatcher
//! - [`interaction`] - invocations and replies exchanged with the platform
//! - [`value`] - dynamically typed argument values

pub mod adapter;
pub mod command;
pub mod interaction;
pub mod resolve;
pub mod syntax;
pub mod value;

pub use crate::adapter::{CommandParseError, CommandSchema, Dispatcher, Platform};
pub use crate::command::{
    ArgumentOptions, BuildError, ChoiceSource, CommandSpec, FinalizedCommand, Requirement,
    ScopeKey, SyntaxBuilder, command, context_menu, syntax_command,
};
pub use crate::interaction::{Invocation, Reply};
pub use crate::resolve::{Arguments, Resolution, ResolutionError};
pub use crate::syntax::{Grammar, SyntaxError};
pub use crate::value::Value;
