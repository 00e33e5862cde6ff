//! Text strategy: resolving a raw message against a command.
//!
//! The message is split into tokens and the top-level flags are pulled out
//! wherever they appear. The remaining tokens are handed to the parameters in
//! declaration order. The subcommand name is expected right after the parameters
//! declared before the first subcommand, and only the tokens following it are
//! searched for that subcommand's flags. Quoted tokens are never flags.

use std::collections::{HashMap, HashSet};

use crate::{
    command::{Argument, CommandSpec, DataType},
    resolve::{ArgumentValue, Resolution, finish, resolved},
    value::Value,
};

const OPEN_QUOTE: char = '“';
const CLOSE_QUOTE: char = '”';

/// A message token, remembering whether it was written inside quotes.
#[derive(Debug, Clone, PartialEq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Splits a message into space-separated tokens.
///
/// Text wrapped in `“...”` is a single token, quotes stripped. An unclosed quote
/// runs to the end of the message.
///
/// # Examples
///
/// ```
/// use slashkit::resolve::split_input;
///
/// assert_eq!(
///     split_input("add “buy milk” 3"),
///     vec!["add", "buy milk", "3"]
/// );
/// ```
pub fn split_input(input: &str) -> Vec<String> {
    tokenize(input).into_iter().map(|token| token.text).collect()
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // Set once the current token has seen a quote, so an empty `“”` still counts
    let mut quoted = false;

    for c in input.chars() {
        match c {
            OPEN_QUOTE if !in_quotes => {
                in_quotes = true;
                quoted = true;
            }
            CLOSE_QUOTE if in_quotes => in_quotes = false,
            c if c.is_whitespace() && !in_quotes => {
                if quoted || !current.is_empty() {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if quoted || !current.is_empty() {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }

    tokens
}

/// Converts a token to the declared datatype, keeping it as text when it does
/// not parse.
fn coerce(datatype: DataType, token: &str) -> Value {
    match datatype {
        DataType::Integer => token
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::from(token)),
        DataType::Number => token
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::from(token)),
        DataType::Boolean => match token.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Value::Bool(true),
            "false" | "no" | "off" | "0" => Value::Bool(false),
            _ => Value::from(token),
        },
        _ => Value::from(token),
    }
}

/// Hands out positional tokens in order.
struct Cursor {
    tokens: Vec<Token>,
    index: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn take(&mut self, argument: &Argument) -> Option<Value> {
        if argument.variadic {
            let rest = self
                .tokens
                .drain(self.index..)
                .map(|token| token.text)
                .collect();
            return Some(Value::List(rest));
        }

        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(coerce(argument.datatype, &token.text))
    }

    /// Pulls the given flags out of the tokens not handed out yet.
    fn extract_remaining(&mut self, flags: &HashSet<&str>, known: &HashSet<&str>) -> HashMap<String, Value> {
        let rest = self.tokens.split_off(self.index);
        let (positional, present) = extract_flags(flags, known, rest);
        self.tokens.extend(positional);
        present
    }
}

/// Flag tokens declared directly by `arguments`.
fn flag_tokens<'a>(arguments: impl IntoIterator<Item = &'a Argument>) -> HashSet<&'a str> {
    arguments
        .into_iter()
        .filter(|argument| argument.is_flag())
        .filter_map(|flag| flag.flag_token.as_deref())
        .collect()
}

/// Separates the tokens of `flags`, and the value each one consumes, from the
/// positional tokens.
///
/// A flag consumes the next token unless it is an unquoted flag token of
/// `known`. Quoted tokens are never flags.
fn extract_flags(
    flags: &HashSet<&str>,
    known: &HashSet<&str>,
    tokens: Vec<Token>,
) -> (Vec<Token>, HashMap<String, Value>) {
    let mut positional = Vec::new();
    let mut present = HashMap::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        if token.quoted || !flags.contains(token.text.as_str()) {
            positional.push(token);
            continue;
        }
        let value = match tokens.next_if(|next| next.quoted || !known.contains(next.text.as_str())) {
            Some(value) => Value::Text(value.text),
            None => Value::from(token.text.as_str()),
        };
        present.insert(token.text, value);
    }

    (positional, present)
}

fn resolve_one(
    spec: &CommandSpec,
    cursor: &mut Cursor,
    present: &HashMap<String, Value>,
    subcommand: Option<&str>,
    argument: &Argument,
) -> ArgumentValue {
    let value = if argument.is_flag() {
        argument
            .flag_token
            .as_ref()
            .and_then(|token| present.get(token))
            .cloned()
    } else {
        cursor.take(argument)
    };
    resolved(spec, subcommand, argument, value)
}

pub(crate) fn resolve_text(spec: &CommandSpec, raw: &str) -> Resolution {
    let known: HashSet<&str> = spec
        .flags()
        .filter_map(|flag| flag.flag_token.as_deref())
        .collect();
    let top_level = flag_tokens(&spec.arguments);

    let (positional, mut present) = extract_flags(&top_level, &known, tokenize(raw));
    let mut cursor = Cursor {
        tokens: positional,
        index: 0,
    };

    let (leading, trailing) = spec.top_level_split();
    let mut values: Vec<ArgumentValue> = leading
        .iter()
        .map(|argument| resolve_one(spec, &mut cursor, &present, None, argument))
        .collect();

    let active = cursor
        .peek()
        .filter(|token| !token.quoted)
        .and_then(|token| spec.subcommand(&token.text));
    if let Some(subcommand) = active {
        cursor.index += 1;
        let scoped = flag_tokens(&subcommand.subarguments);
        present.extend(cursor.extract_remaining(&scoped, &known));

        for argument in &subcommand.subarguments {
            values.push(resolve_one(
                spec,
                &mut cursor,
                &present,
                Some(subcommand.name.as_str()),
                argument,
            ));
        }
    }

    for argument in trailing {
        values.push(resolve_one(spec, &mut cursor, &present, None, argument));
    }

    finish(values, active.map(|subcommand| subcommand.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgumentOptions, ChoiceSource, command};

    fn testy() -> std::sync::Arc<CommandSpec> {
        command("testy", "A test command")
            .unwrap()
            .argument("<subcmd>", None)
            .unwrap()
            .argument("<required>", None)
            .unwrap()
            .argument("[optional; Noob; A|B|C|D]", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec()
    }

    fn todo() -> std::sync::Arc<CommandSpec> {
        command("todo", "Manage todos")
            .unwrap()
            .argument("add <item...>", None)
            .unwrap()
            .argument_with(
                "add [priority: integer]",
                None,
                ChoiceSource::None,
                ArgumentOptions::default().with_default(3i64),
            )
            .unwrap()
            .argument("remove <index: int>", None)
            .unwrap()
            .argument("list (-a all)", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec()
    }

    fn value(resolution: &Resolution, name: &str) -> Option<Value> {
        resolution.arg(name).and_then(|arg| arg.value.clone())
    }

    #[test]
    fn test_split_input_plain() {
        assert_eq!(split_input("  add   widget "), vec!["add", "widget"]);
        assert!(split_input("").is_empty());
    }

    #[test]
    fn test_split_input_quotes() {
        assert_eq!(
            split_input("say “hello there” twice"),
            vec!["say", "hello there", "twice"]
        );
        assert_eq!(split_input("“” x"), vec!["", "x"]);
        assert_eq!(split_input("“never closed here"), vec!["never closed here"]);
    }

    #[test]
    fn test_tokenize_marks_quoted_tokens() {
        let tokens = tokenize("-u “-u” “”");
        let quoted: Vec<bool> = tokens.iter().map(|token| token.quoted).collect();
        assert_eq!(quoted, vec![false, true, true]);
        assert_eq!(tokens[1].text, "-u");
    }

    #[test]
    fn test_positional_mapping() {
        let resolution = resolve_text(&testy(), "add widget choiceA");
        assert_eq!(value(&resolution, "subcmd"), Some(Value::from("add")));
        assert_eq!(value(&resolution, "required"), Some(Value::from("widget")));
        assert_eq!(value(&resolution, "optional"), Some(Value::from("choiceA")));
        assert!(resolution.flags.is_empty());
        assert!(resolution.subcommand.is_none());
    }

    #[test]
    fn test_missing_optional_is_absent() {
        let resolution = resolve_text(&testy(), "add widget");
        assert_eq!(value(&resolution, "optional"), None);
        assert_eq!(resolution.args.len(), 3);
    }

    #[test]
    fn test_quoted_token() {
        let resolution = resolve_text(&testy(), "add “big widget” B");
        assert_eq!(value(&resolution, "required"), Some(Value::from("big widget")));
        assert_eq!(value(&resolution, "optional"), Some(Value::from("B")));
    }

    #[test]
    fn test_subcommand_detection() {
        let resolution = resolve_text(&todo(), "add buy some milk");
        assert_eq!(resolution.subcommand.as_deref(), Some("add"));
        let item = resolution.arg("item").unwrap();
        assert_eq!(item.subcommand.as_deref(), Some("add"));
        assert_eq!(
            item.value,
            Some(Value::List(vec!["buy".into(), "some".into(), "milk".into()]))
        );
        // The variadic took every token, so the default applies
        let priority = resolution.arg("priority").unwrap();
        assert_eq!(priority.value, Some(Value::Integer(3)));
        assert!(priority.defaulted);
    }

    #[test]
    fn test_empty_variadic() {
        let resolution = resolve_text(&todo(), "add");
        assert_eq!(value(&resolution, "item"), Some(Value::List(Vec::new())));
    }

    #[test]
    fn test_coercion() {
        let resolution = resolve_text(&todo(), "remove 2");
        assert_eq!(value(&resolution, "index"), Some(Value::Integer(2)));

        let resolution = resolve_text(&todo(), "remove two");
        assert_eq!(value(&resolution, "index"), Some(Value::from("two")));
    }

    #[test]
    fn test_unknown_subcommand_token() {
        let resolution = resolve_text(&todo(), "rename x");
        assert!(resolution.subcommand.is_none());
        assert!(resolution.args.is_empty());
    }

    #[test]
    fn test_flag_present() {
        let resolution = resolve_text(&todo(), "list -a");
        let all = resolution.flag("all").unwrap();
        assert_eq!(all.flag.as_deref(), Some("-a"));
        assert_eq!(all.value, Some(Value::from("-a")));
        assert_eq!(resolution.subcommand.as_deref(), Some("list"));
    }

    #[test]
    fn test_flag_absent() {
        let resolution = resolve_text(&todo(), "list");
        let all = resolution.flag("all").unwrap();
        assert!(!all.is_present());
    }

    #[test]
    fn test_flag_is_order_independent() {
        let spec = command("deploy", "Deploy")
            .unwrap()
            .argument("<target>", None)
            .unwrap()
            .argument("(-e env)", None)
            .unwrap()
            .argument("(-f force)", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec();

        let resolution = resolve_text(&spec, "-e staging api -f");
        assert_eq!(value(&resolution, "target"), Some(Value::from("api")));
        assert_eq!(
            resolution.flag("env").unwrap().value,
            Some(Value::from("staging"))
        );
        assert_eq!(resolution.flag("force").unwrap().value, Some(Value::from("-f")));

        // A flag followed by another flag consumes nothing
        let resolution = resolve_text(&spec, "-f -e prod api");
        assert_eq!(resolution.flag("force").unwrap().value, Some(Value::from("-f")));
        assert_eq!(resolution.flag("env").unwrap().value, Some(Value::from("prod")));
        assert_eq!(value(&resolution, "target"), Some(Value::from("api")));
    }

    #[test]
    fn test_leading_arguments_before_subcommand() {
        let spec = command("game", "Games")
            .unwrap()
            .argument("<id>", None)
            .unwrap()
            .argument("join <player>", None)
            .unwrap()
            .argument("leave [reason...]", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec();

        let resolution = resolve_text(&spec, "42 join alice");
        assert_eq!(value(&resolution, "id"), Some(Value::from("42")));
        assert_eq!(resolution.subcommand.as_deref(), Some("join"));
        assert_eq!(value(&resolution, "player"), Some(Value::from("alice")));
    }

    #[test]
    fn test_flags_of_other_subcommands_stay_positional() {
        let spec = command("todo", "Manage todos")
            .unwrap()
            .argument("add <item...>", None)
            .unwrap()
            .argument("list (-p priorities)", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec();

        let resolution = resolve_text(&spec, "add fix -p flag");
        assert_eq!(resolution.subcommand.as_deref(), Some("add"));
        assert_eq!(
            value(&resolution, "item"),
            Some(Value::List(vec!["fix".into(), "-p".into(), "flag".into()]))
        );
        assert!(resolution.flag("priorities").is_none());

        let resolution = resolve_text(&spec, "list -p");
        assert!(resolution.flag("priorities").unwrap().is_present());
    }

    #[test]
    fn test_quoted_token_is_never_a_flag() {
        let spec = command("echo", "Echo")
            .unwrap()
            .argument("<words...>", None)
            .unwrap()
            .argument("(-u upper)", None)
            .unwrap()
            .build()
            .unwrap()
            .into_spec();

        let resolution = resolve_text(&spec, "hello “-u” there");
        assert_eq!(
            value(&resolution, "words"),
            Some(Value::List(vec!["hello".into(), "-u".into(), "there".into()]))
        );
        assert!(!resolution.flag("upper").unwrap().is_present());

        // A quoted flag token can still be a flag value
        let resolution = resolve_text(&spec, "hello -u “-u”");
        assert_eq!(resolution.flag("upper").unwrap().value, Some(Value::from("-u")));
        assert_eq!(value(&resolution, "words"), Some(Value::List(vec!["hello".into()])));
    }
}
