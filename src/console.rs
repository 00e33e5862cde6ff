//! A console platform driving the dispatcher from stdin.
//!
//! Each input line is one invocation:
//!
//! | Line | Strategy |
//! |------|----------|
//! | `!todo add buy milk` | text message, parsed with the configured prefix |
//! | `/todo add item="buy milk" priority=2` | structured interaction |
//! | `?todo remove item bu` | autocomplete request for `item` |
//!
//! Replies are printed to stdout; ephemeral ones are marked as such.

use log::{debug, error, info};
use slashkit::{
    CommandSchema, Dispatcher, Invocation, Platform, Reply, Value, resolve::split_input,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prefix of structured interaction lines.
const STRUCTURED_PREFIX: char = '/';
/// Prefix of autocomplete request lines.
const AUTOCOMPLETE_PREFIX: char = '?';

/// A platform printing everything to stdout.
#[derive(Debug, Default)]
pub struct ConsolePlatform {
    /// Print registration payloads as they are registered
    pub print_schemas: bool,
}

impl Platform for ConsolePlatform {
    async fn register_command(&self, schema: &CommandSchema) -> anyhow::Result<()> {
        info!("registering command `{}`", schema.name);
        if self.print_schemas {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        Ok(())
    }

    async fn respond(&self, invocation: &Invocation, reply: &Reply) -> anyhow::Result<()> {
        match reply {
            Reply::Message(content) => println!("{}", content),
            Reply::Ephemeral(content) => {
                println!("(only visible to {}) {}", invocation.user_id, content)
            }
            Reply::Silent => debug!("`{}` replied nothing", invocation.command_name),
        }
        Ok(())
    }

    async fn respond_autocomplete(
        &self,
        _invocation: &Invocation,
        choices: Vec<String>,
    ) -> anyhow::Result<()> {
        if choices.is_empty() {
            println!("(no suggestions)");
        }
        for choice in choices {
            println!("> {}", choice);
        }
        Ok(())
    }
}

/// What a console line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    /// Blank line
    Empty,
    /// A chat message, possibly a text command
    Text(String),
    /// A structured interaction
    Structured(Invocation),
    /// An autocomplete request
    Autocomplete(Invocation),
}

/// Parses one console line.
///
/// The token after the command name is taken as the subcommand when the command
/// declares a subcommand of that name.
///
/// # Arguments
///
/// * `line` - The raw input line
/// * `dispatcher` - Used to look up declared subcommands
/// * `template` - Identity of the console user
pub fn parse_line<P: Platform>(
    line: &str,
    dispatcher: &Dispatcher<P>,
    template: &Invocation,
) -> ConsoleLine {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleLine::Empty;
    }

    let (kind, rest) = match line.chars().next() {
        Some(STRUCTURED_PREFIX) => (STRUCTURED_PREFIX, &line[1..]),
        Some(AUTOCOMPLETE_PREFIX) => (AUTOCOMPLETE_PREFIX, &line[1..]),
        _ => return ConsoleLine::Text(line.to_owned()),
    };

    let mut tokens = split_input(rest).into_iter().peekable();
    let Some(name) = tokens.next() else {
        return ConsoleLine::Empty;
    };
    let mut invocation = Invocation {
        command_name: name.clone(),
        ..template.clone()
    };

    let declares = |subcommand: &str| {
        dispatcher
            .command(&name)
            .is_some_and(|spec| spec.subcommand(subcommand).is_some())
    };
    if let Some(subcommand) = tokens.next_if(|token| declares(token)) {
        invocation.subcommand = Some(subcommand);
    }

    if kind == AUTOCOMPLETE_PREFIX {
        if let Some(focused) = tokens.next() {
            let partial: Vec<String> = tokens.collect();
            invocation.options.insert(focused.clone(), Value::from(partial.join(" ")));
            invocation.focused = Some(focused);
        }
        return ConsoleLine::Autocomplete(invocation);
    }

    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) => {
                invocation.options.insert(key.to_owned(), parse_value(value));
            }
            None => debug!("ignoring `{}`, options are written key=value", token),
        }
    }
    ConsoleLine::Structured(invocation)
}

/// Types a structured option value the way a platform would deliver it.
fn parse_value(value: &str) -> Value {
    if let Ok(integer) = value.parse::<i64>() {
        return Value::Integer(integer);
    }
    if let Ok(number) = value.parse::<f64>() {
        return Value::Number(number);
    }
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::from(value),
    }
}

/// Reads stdin line by line until it is closed, handling each line.
///
/// A line that fails is logged and does not stop the loop.
pub async fn run<P: Platform>(dispatcher: &Dispatcher<P>, template: &Invocation) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let result = match parse_line(&line, dispatcher, template) {
            ConsoleLine::Empty => Ok(()),
            ConsoleLine::Text(body) => dispatcher
                .handle_message(&body, template)
                .await
                .map(|reply| {
                    if reply.is_none() {
                        println!(
                            "(not a command, type `{}help` for the list)",
                            dispatcher.prefix()
                        );
                    }
                }),
            ConsoleLine::Structured(invocation) => dispatcher.dispatch(invocation).await.map(drop),
            ConsoleLine::Autocomplete(invocation) => {
                dispatcher.autocomplete(&invocation).await.map(drop)
            }
        };

        if let Err(e) = result {
            error!("failed to handle `{}`: {:#}", line, e);
        }
    }

    info!("stdin closed, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use slashkit::{adapter::MockPlatform, command};

    use super::*;

    async fn dispatcher() -> Dispatcher<MockPlatform> {
        let mut platform = MockPlatform::new();
        platform.expect_register_command().returning(|_| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        let todo = command("todo", "Manage todos")
            .unwrap()
            .argument("add <item>", None)
            .unwrap()
            .argument("add [priority: integer]", None)
            .unwrap()
            .build()
            .unwrap();
        dispatcher.register(todo).await.unwrap();
        dispatcher
    }

    #[tokio::test]
    async fn test_parse_structured_line() {
        let dispatcher = dispatcher().await;
        let template = Invocation::new("", "console");

        let line = parse_line(
            "/todo add item=“buy milk” priority=2",
            &dispatcher,
            &template,
        );
        let expected = Invocation::new("todo", "console")
            .with_subcommand("add")
            .with_option("item", Value::from("buy milk"))
            .with_option("priority", Value::Integer(2));
        assert_eq!(line, ConsoleLine::Structured(expected));
    }

    #[tokio::test]
    async fn test_parse_autocomplete_line() {
        let dispatcher = dispatcher().await;
        let template = Invocation::new("", "console");

        let line = parse_line("?todo add item bu", &dispatcher, &template);
        let expected = Invocation::new("todo", "console")
            .with_subcommand("add")
            .with_focused("item")
            .with_option("item", Value::from("bu"));
        assert_eq!(line, ConsoleLine::Autocomplete(expected));
    }

    #[tokio::test]
    async fn test_parse_text_and_empty_lines() {
        let dispatcher = dispatcher().await;
        let template = Invocation::new("", "console");

        assert_eq!(parse_line("   ", &dispatcher, &template), ConsoleLine::Empty);
        assert_eq!(parse_line("/", &dispatcher, &template), ConsoleLine::Empty);
        assert_eq!(
            parse_line("!todo add milk", &dispatcher, &template),
            ConsoleLine::Text("!todo add milk".to_owned())
        );
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("3"), Value::Integer(3));
        assert_eq!(parse_value("2.5"), Value::Number(2.5));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("milk"), Value::from("milk"));
    }
}
