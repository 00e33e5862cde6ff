//! Demo commands registered by the console host.
//!
//! They cover the declaration styles the library supports: literal choices and
//! restrictions (`testy`), a whole-command syntax string (`anotha`), subcommands
//! with typed bounds, defaults, autocomplete and a flag (`todo`), and a message
//! context menu (`Inspect`).

use std::sync::Arc;

use log::debug;
use slashkit::{
    ArgumentOptions, Arguments, BuildError, ChoiceSource, FinalizedCommand, Reply, command,
    context_menu, syntax_command,
};
use tokio::sync::Mutex;

/// One todo item.
#[derive(Debug, Clone, PartialEq)]
struct Todo {
    item: String,
    priority: i64,
}

/// Todo items shared by the `todo` action and its autocomplete callback.
type TodoList = Arc<Mutex<Vec<Todo>>>;

/// Builds every demo command.
pub fn commands() -> Result<Vec<FinalizedCommand>, BuildError> {
    Ok(vec![testy()?, anotha()?, todo(TodoList::default())?, inspect()?])
}

fn testy() -> Result<FinalizedCommand, BuildError> {
    command("testy", "A test command")?
        .argument_with(
            "<subcmd; Sub command>",
            None,
            ChoiceSource::literal(["add", "delete"]),
            ArgumentOptions::default(),
        )?
        .argument("<required; A required argument>", None)?
        .argument("[optional; Noob; Choice A|Choice B|Choice C]", None)?
        .requires(["ADMINISTRATOR", "@Bot"])?
        .guild("668485643487412234")?
        .action(|_, arguments, _| async move {
            Ok(Reply::message(format!(
                "testy {} `{}` with `{}`",
                arguments.get_str("subcmd").unwrap_or_default(),
                arguments.get_str("required").unwrap_or_default(),
                arguments.get_str("optional").unwrap_or("nothing"),
            )))
        })
}

fn anotha() -> Result<FinalizedCommand, BuildError> {
    syntax_command("anotha;+Another+test+command <req; An argument> [opt; Choice; A|B]")?.action(
        |_, arguments, _| async move { Ok(Reply::message(arguments.to_json().to_string())) },
    )
}

fn todo(list: TodoList) -> Result<FinalizedCommand, BuildError> {
    let suggestions = Arc::clone(&list);

    command("todo", "Manage a todo list")?
        .subcommands([
            ("add", "Add an item"),
            ("remove", "Remove an item"),
            ("list", "List the items"),
        ])?
        .argument("add <item...; Item to add>", None)?
        .argument_with(
            "add [priority: integer; Priority from 1 to 5]",
            None,
            ChoiceSource::None,
            ArgumentOptions::default()
                .with_min(1.0)
                .with_max(5.0)
                .with_default(3i64),
        )?
        .argument_with(
            "remove <item...; Item to remove>",
            None,
            ChoiceSource::dynamic(move |partial: String, _| {
                let list = Arc::clone(&suggestions);
                async move {
                    let list = list.lock().await;
                    Ok(list
                        .iter()
                        .map(|todo| todo.item.clone())
                        .filter(|item| item.starts_with(&partial))
                        .collect())
                }
            }),
            ArgumentOptions::default(),
        )?
        .argument("list (-p priorities; Show priorities)", None)?
        .action(move |_, arguments, _| {
            let list = Arc::clone(&list);
            async move { run_todo(&list, &arguments).await }
        })
}

async fn run_todo(list: &TodoList, arguments: &Arguments) -> anyhow::Result<Reply> {
    let mut list = list.lock().await;
    debug!("todo list holds {} items", list.len());

    match arguments.subcommand() {
        Some("add") => {
            let item = arguments.get_list("item").unwrap_or_default().join(" ");
            let priority = arguments.get_i64("priority").unwrap_or(3);
            list.push(Todo {
                item: item.clone(),
                priority,
            });
            Ok(Reply::message(format!("Added `{item}`")))
        }
        Some("remove") => {
            let item = arguments.get_list("item").unwrap_or_default().join(" ");
            match list.iter().position(|todo| todo.item == item) {
                Some(index) => {
                    list.remove(index);
                    Ok(Reply::message(format!("Removed `{item}`")))
                }
                None => Ok(Reply::ephemeral(format!("No item named `{item}`"))),
            }
        }
        Some("list") if list.is_empty() => Ok(Reply::message("Nothing to do.")),
        Some("list") => {
            let mut todos = list.clone();
            todos.sort_by(|a, b| b.priority.cmp(&a.priority));
            let lines: Vec<String> = todos
                .iter()
                .map(|todo| {
                    if arguments.flag("priorities") {
                        format!("- {} ({})", todo.item, todo.priority)
                    } else {
                        format!("- {}", todo.item)
                    }
                })
                .collect();
            Ok(Reply::message(lines.join("\n")))
        }
        other => anyhow::bail!("unexpected todo subcommand {:?}", other),
    }
}

fn inspect() -> Result<FinalizedCommand, BuildError> {
    context_menu("Inspect")?
        .kind("message")?
        .action(|_, arguments, _| async move {
            Ok(Reply::ephemeral(format!("```json\n{}\n```", arguments.to_json())))
        })
}
