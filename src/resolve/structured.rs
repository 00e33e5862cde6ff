//! Structured strategy: resolving named options and context menu targets.

use crate::{
    command::{Argument, CommandSpec},
    interaction::Invocation,
    resolve::{ArgumentValue, Resolution, ResolutionError, finish, resolved},
    value::Value,
};

/// Key the platform uses for a context menu entry it could not resolve.
const NULL_TARGET: &str = "null";

/// Looks an option up by its name, then by its `subcommand:name` key.
fn lookup(invocation: &Invocation, subcommand: Option<&str>, argument: &Argument) -> Option<Value> {
    invocation
        .options
        .get(&argument.name)
        .or_else(|| {
            subcommand.and_then(|subcommand| {
                invocation
                    .options
                    .get(&format!("{}:{}", subcommand, argument.name))
            })
        })
        .cloned()
}

pub(crate) fn resolve_structured(
    spec: &CommandSpec,
    invocation: &Invocation,
) -> Result<Resolution, ResolutionError> {
    let active = match invocation.subcommand.as_deref() {
        Some(name) => Some(
            spec.subcommand(name)
                .ok_or_else(|| ResolutionError::UnknownSubcommand(name.to_owned()))?,
        ),
        None => None,
    };

    let mut values = Vec::new();
    for argument in &spec.arguments {
        if !argument.is_command() {
            let value = lookup(invocation, None, argument);
            values.push(resolved(spec, None, argument, value));
            continue;
        }
        // Only the active subcommand's parameters are resolved
        if active.is_some_and(|subcommand| subcommand.name == argument.name) {
            let scope = Some(argument.name.as_str());
            for subargument in &argument.subarguments {
                let value = lookup(invocation, scope, subargument);
                values.push(resolved(spec, scope, subargument, value));
            }
        }
    }

    Ok(finish(
        values,
        active.map(|subcommand| subcommand.name.clone()),
    ))
}

/// Turns the target entries of a context menu invocation into arguments.
///
/// Entries are sorted by key, and the unresolved `null` entry is skipped.
pub(crate) fn resolve_target(invocation: &Invocation) -> Resolution {
    let mut entries: Vec<(&String, &Value)> = invocation
        .target
        .iter()
        .filter(|(key, _)| key.as_str() != NULL_TARGET)
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let values = entries
        .into_iter()
        .map(|(key, value)| ArgumentValue {
            name: key.clone(),
            value: Some(value.clone()),
            flag: None,
            subcommand: None,
            defaulted: false,
        })
        .collect();

    finish(values, None)
}
