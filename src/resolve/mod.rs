//! Argument resolution: mapping a live invocation onto a [`CommandSpec`].
//!
//! Three strategies share one output shape:
//!
//! - **context menu** - the platform's target entries become the arguments
//! - **text** - the invocation carries a raw message, split into tokens
//! - **structured** - the invocation carries named options and a subcommand
//!
//! Absent user input is never an error: optional arguments fall back to their
//! declared default, everything else stays absent. A [`ResolutionError`] only
//! signals an inconsistent [`CommandSpec`].

use log::debug;
use thiserror::Error;

use crate::{
    command::{Argument, CommandSpec, ScopeKey},
    interaction::Invocation,
    value::Value,
};

mod arguments;
mod structured;
mod text;

pub use crate::resolve::arguments::Arguments;
pub use crate::resolve::text::split_input;

/// One resolved argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentValue {
    pub name: String,
    /// Resolved value, or the default for an absent optional argument
    pub value: Option<Value>,
    /// Short token, set only for flags
    pub flag: Option<String>,
    /// Owning subcommand
    pub subcommand: Option<String>,
    /// `true` when `value` came from the declared default
    pub defaulted: bool,
}

impl ArgumentValue {
    pub fn is_flag(&self) -> bool {
        self.flag.is_some()
    }

    /// Returns `true` for a flag given in the input.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Result of resolving one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Non-flag arguments, in declaration order
    pub args: Vec<ArgumentValue>,
    /// Flags, in declaration order
    pub flags: Vec<ArgumentValue>,
    /// Active subcommand
    pub subcommand: Option<String>,
}

impl Resolution {
    pub fn arg(&self, name: &str) -> Option<&ArgumentValue> {
        self.args.iter().find(|arg| arg.name == name)
    }

    pub fn flag(&self, name: &str) -> Option<&ArgumentValue> {
        self.flags.iter().find(|flag| flag.name == name)
    }
}

/// Inconsistencies of a [`CommandSpec`] found while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// An argument has no name, so its scope key cannot be built
    #[error("an argument of `{0}` has no name")]
    UnnamedArgument(String),
    /// The invocation names a subcommand the command does not declare
    #[error("unknown subcommand `{0}`")]
    UnknownSubcommand(String),
}

/// Resolves an invocation against a command.
///
/// Context menus resolve their target entries, invocations carrying a raw message
/// take the text strategy and every other invocation the structured one.
///
/// # Errors
///
/// Returns a [`ResolutionError`] when the command declares an unnamed argument
/// or when the invocation names an undeclared subcommand.
///
/// # Examples
///
/// ```
/// use slashkit::{Invocation, command, resolve::resolve};
///
/// let spec = command("testy", "Test")?
///     .argument("<subcmd>", None)?
///     .argument("<required>", None)?
///     .argument("[optional; Noob; A|B|C|D]", None)?
///     .build()?
///     .into_spec();
///
/// let invocation = Invocation::new("testy", "42").with_raw("add widget choiceA");
/// let resolution = resolve(&spec, &invocation)?;
/// let values: Vec<String> = resolution
///     .args
///     .iter()
///     .map(|arg| arg.value.as_ref().unwrap().to_string())
///     .collect();
/// assert_eq!(values, vec!["add", "widget", "choiceA"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn resolve(spec: &CommandSpec, invocation: &Invocation) -> Result<Resolution, ResolutionError> {
    check_names(spec)?;

    let resolution = if spec.command_type.is_context_menu() {
        structured::resolve_target(invocation)
    } else if let Some(raw) = &invocation.raw {
        text::resolve_text(spec, raw)
    } else {
        structured::resolve_structured(spec, invocation)?
    };

    debug!(
        "resolved `{}`: {} args, {} flags, subcommand {:?}",
        spec.name,
        resolution.args.len(),
        resolution.flags.len(),
        resolution.subcommand
    );

    Ok(resolution)
}

fn check_names(spec: &CommandSpec) -> Result<(), ResolutionError> {
    let unnamed = spec
        .arguments
        .iter()
        .flat_map(|argument| std::iter::once(argument).chain(argument.subarguments.iter()))
        .any(|argument| argument.name.trim().is_empty());

    if unnamed {
        return Err(ResolutionError::UnnamedArgument(spec.name.clone()));
    }
    Ok(())
}

/// Builds the value of one argument, substituting its default when allowed.
fn resolved(
    spec: &CommandSpec,
    subcommand: Option<&str>,
    argument: &Argument,
    value: Option<Value>,
) -> ArgumentValue {
    let mut defaulted = false;
    let value = match value {
        Some(value) => Some(value),
        None if argument.optional && !argument.is_flag() => {
            let default = spec
                .default_for(&ScopeKey::new(subcommand, &argument.name))
                .cloned();
            defaulted = default.is_some();
            default
        }
        None => None,
    };

    ArgumentValue {
        name: argument.name.clone(),
        value,
        flag: argument.flag_token.clone().filter(|_| argument.is_flag()),
        subcommand: subcommand.map(str::to_owned),
        defaulted,
    }
}

/// Partitions resolved values into args and flags, keeping relative order.
fn finish(values: Vec<ArgumentValue>, subcommand: Option<String>) -> Resolution {
    let (flags, args): (Vec<ArgumentValue>, Vec<ArgumentValue>) =
        values.into_iter().partition(ArgumentValue::is_flag);
    Resolution {
        args,
        flags,
        subcommand,
    }
}
