//! Structural model of a command's parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a bareword fragment, decided by its position in a syntax string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandRole {
    /// The command itself (position 0)
    Root,
    /// A subcommand group (position 1 of a whole-command syntax string)
    Group,
    /// A subcommand
    Sub,
}

/// Kind of an [`Argument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentKind {
    /// Subcommand or subgroup marker, owning its own subarguments
    Command(CommandRole),
    /// Positional parameter
    Positional,
    /// Optional flag introduced by a short token
    Flag,
}

/// Declared data type of a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mention,
}

impl DataType {
    /// Parses a datatype name, accepting the usual aliases (`int`, `float`,
    /// `bool`, `mentionable`, ...). Matching is case-insensitive.
    pub fn parse(name: &str) -> Option<DataType> {
        let data_type = match name.trim().to_lowercase().as_str() {
            "string" | "str" | "text" => DataType::String,
            "number" | "num" | "float" => DataType::Number,
            "integer" | "int" | "intg" => DataType::Integer,
            "boolean" | "bool" => DataType::Boolean,
            "user" => DataType::User,
            "channel" => DataType::Channel,
            "role" => DataType::Role,
            "mention" | "mentionable" => DataType::Mention,
            _ => return None,
        };
        Some(data_type)
    }

    /// Returns `true` for types that accept `min`/`max` bounds.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Number | DataType::Integer)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::User => "user",
            DataType::Channel => "channel",
            DataType::Role => "role",
            DataType::Mention => "mention",
        };
        write!(f, "{name}")
    }
}

/// One declared command parameter, subcommand or flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub kind: ArgumentKind,
    /// Identifier, unique within its owning scope
    pub name: String,
    pub description: String,
    /// Always `false` for commands, always `true` for flags
    pub optional: bool,
    /// Consumes every remaining token on the text strategy
    pub variadic: bool,
    pub datatype: DataType,
    /// Short token of a flag, e.g. `-f`
    pub flag_token: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Parameters of a subcommand; empty for every other kind
    pub subarguments: Vec<Argument>,
}

impl Argument {
    /// Creates a subcommand marker with no parameters.
    pub fn subcommand(name: &str, description: &str) -> Self {
        Argument {
            kind: ArgumentKind::Command(CommandRole::Sub),
            name: name.to_owned(),
            description: description.to_owned(),
            optional: false,
            variadic: false,
            datatype: DataType::String,
            flag_token: None,
            min: None,
            max: None,
            subarguments: Vec::new(),
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, ArgumentKind::Command(_))
    }

    pub fn is_flag(&self) -> bool {
        self.kind == ArgumentKind::Flag
    }

    /// Renders the argument back into syntax form, e.g. `[name...]` or `(-f name)`.
    pub fn usage(&self) -> String {
        let dots = if self.variadic { "..." } else { "" };
        match self.kind {
            ArgumentKind::Command(_) => self.name.clone(),
            ArgumentKind::Flag => format!(
                "({} {})",
                self.flag_token.as_deref().unwrap_or_default(),
                self.name
            ),
            ArgumentKind::Positional if self.optional => format!("[{}{dots}]", self.name),
            ArgumentKind::Positional => format!("<{}{dots}>", self.name),
        }
    }
}

/// Lookup key namespacing choices, defaults and autocomplete per subcommand.
///
/// Displays as `subcommand:name`, or bare `name` at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub subcommand: Option<String>,
    pub name: String,
}

impl ScopeKey {
    pub fn new(subcommand: Option<&str>, name: &str) -> Self {
        ScopeKey {
            subcommand: subcommand.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    pub fn top(name: &str) -> Self {
        ScopeKey::new(None, name)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcommand {
            Some(subcommand) => write!(f, "{}:{}", subcommand, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A permission or role the invoking member must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Requirement {
    Permission(String),
    Role(String),
}

/// Kind of registered command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    /// Slash command
    #[default]
    ChatInput,
    /// Context menu on a user
    User,
    /// Context menu on a message
    Message,
}

impl CommandType {
    /// Registration type code used by slash-command platforms.
    pub fn code(&self) -> u8 {
        match self {
            CommandType::ChatInput => 1,
            CommandType::User => 2,
            CommandType::Message => 3,
        }
    }

    pub fn is_context_menu(&self) -> bool {
        !matches!(self, CommandType::ChatInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_aliases() {
        assert_eq!(DataType::parse("int"), Some(DataType::Integer));
        assert_eq!(DataType::parse("Float"), Some(DataType::Number));
        assert_eq!(DataType::parse("bool"), Some(DataType::Boolean));
        assert_eq!(DataType::parse("mentionable"), Some(DataType::Mention));
        assert_eq!(DataType::parse("emoji"), None);
    }

    #[test]
    fn test_datatype_numeric() {
        assert!(DataType::Integer.is_numeric());
        assert!(DataType::Number.is_numeric());
        assert!(!DataType::String.is_numeric());
        assert!(!DataType::User.is_numeric());
    }

    #[test]
    fn test_scope_key_display() {
        assert_eq!(ScopeKey::new(Some("add"), "item").to_string(), "add:item");
        assert_eq!(ScopeKey::top("item").to_string(), "item");
    }

    #[test]
    fn test_usage_rendering() {
        let mut argument = Argument::subcommand("add", "Add");
        assert_eq!(argument.usage(), "add");

        argument.kind = ArgumentKind::Positional;
        argument.name = "words".to_owned();
        argument.variadic = true;
        argument.optional = true;
        assert_eq!(argument.usage(), "[words...]");

        argument.kind = ArgumentKind::Flag;
        argument.flag_token = Some("-a".to_owned());
        argument.name = "all".to_owned();
        assert_eq!(argument.usage(), "(-a all)");
    }
}
