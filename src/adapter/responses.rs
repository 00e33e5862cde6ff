//! Markdown responses sent by the dispatcher itself.

use std::sync::Arc;

use crate::command::{CommandSpec, CommandType};

/// Formats the help message listing every registered command.
///
/// Chat-input commands are listed with one usage line per subcommand, context
/// menus by name.
///
/// # Examples
///
/// ```
/// # use slashkit::{adapter::format_help, command};
/// let ping = command("ping", "Check the bot is alive").unwrap().build().unwrap();
/// let help = format_help("!", &[ping.into_spec()]);
/// assert!(help.contains("- `!ping`: Check the bot is alive"));
/// ```
pub fn format_help(prefix: &str, specs: &[Arc<CommandSpec>]) -> String {
    if specs.is_empty() {
        return "No commands registered.".to_owned();
    }

    let mut lines = vec!["Commands:".to_owned()];
    for spec in specs {
        match spec.command_type {
            CommandType::ChatInput => {
                for usage in spec.usage() {
                    lines.push(format!("- `{prefix}{usage}`: {}", spec.description));
                }
            }
            CommandType::User => lines.push(format!("- *{}*: user menu", spec.name)),
            CommandType::Message => lines.push(format!("- *{}*: message menu", spec.name)),
        }
    }
    lines.push(String::new());
    lines.push(format!("Type `{prefix}help` to show this help message."));

    lines.join("\n")
}

/// Formats a response for a command that is not registered.
pub fn format_unknown_command(prefix: &str, name: &str) -> String {
    format!("Unknown command `{name}`. Type `{prefix}help` for more information.")
}

/// Formats a response for a command used outside its channels or guilds.
pub fn format_not_available(name: &str) -> String {
    format!("The `{name}` command is not available here.")
}

/// Formats the generic response to a dispatch that failed.
pub fn format_dispatch_failure() -> String {
    "Something went wrong while running this command.".to_owned()
}
