//! Registration payload of a command.
//!
//! The payload follows the shape slash-command platforms expect when registering
//! a command: a `type` code, nested `options` with numeric kinds, `choices`,
//! `autocomplete` and bounds. Restrictions (permissions, roles, channels and
//! guilds) are passed along for the platform to enforce.

use serde::{Serialize, Serializer};

use crate::command::{Argument, ArgumentKind, CommandRole, CommandSpec, DataType, ScopeKey};

/// Kind of a registered option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionKind {
    Subcommand = 1,
    SubcommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
}

impl OptionKind {
    fn of(argument: &Argument) -> Self {
        match argument.kind {
            ArgumentKind::Command(CommandRole::Group) => OptionKind::SubcommandGroup,
            ArgumentKind::Command(_) => OptionKind::Subcommand,
            // Platforms deliver flags as a one-choice string option
            ArgumentKind::Flag => OptionKind::String,
            ArgumentKind::Positional => match argument.datatype {
                DataType::String => OptionKind::String,
                DataType::Integer => OptionKind::Integer,
                DataType::Boolean => OptionKind::Boolean,
                DataType::User => OptionKind::User,
                DataType::Channel => OptionKind::Channel,
                DataType::Role => OptionKind::Role,
                DataType::Mention => OptionKind::Mentionable,
                DataType::Number => OptionKind::Number,
            },
        }
    }
}

impl Serialize for OptionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// One literal choice. Name and value are the same string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceSchema {
    pub name: String,
    pub value: String,
}

impl From<&String> for ChoiceSchema {
    fn from(choice: &String) -> Self {
        ChoiceSchema {
            name: choice.clone(),
            value: choice.clone(),
        }
    }
}

/// One registered option, possibly a subcommand with nested options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSchema {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceSchema>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub autocomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
}

impl OptionSchema {
    fn from_argument(spec: &CommandSpec, subcommand: Option<&str>, argument: &Argument) -> Self {
        let key = ScopeKey::new(subcommand, &argument.name);
        let options = if argument.is_command() {
            argument
                .subarguments
                .iter()
                .map(|subargument| {
                    OptionSchema::from_argument(spec, Some(argument.name.as_str()), subargument)
                })
                .collect()
        } else {
            Vec::new()
        };

        OptionSchema {
            kind: OptionKind::of(argument),
            name: argument.name.clone(),
            description: argument.description.clone(),
            required: !argument.is_command() && !argument.optional,
            choices: spec
                .choices_for(&key)
                .unwrap_or_default()
                .iter()
                .map(ChoiceSchema::from)
                .collect(),
            autocomplete: spec.has_autocomplete(&key),
            min_value: argument.min,
            max_value: argument.max,
            options,
        }
    }
}

/// Registration payload of one command.
///
/// # Examples
///
/// ```
/// use slashkit::{adapter::CommandSchema, command};
///
/// let spec = command("roll", "Roll dice")?
///     .argument("<sides: integer; Number of sides>", None)?
///     .build()?
///     .into_spec();
///
/// let json = CommandSchema::from_spec(&spec).to_json();
/// assert_eq!(json["type"], 1);
/// assert_eq!(json["options"][0]["type"], 4);
/// assert_eq!(json["options"][0]["required"], true);
/// # Ok::<(), slashkit::BuildError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSchema {
    #[serde(rename = "type")]
    pub command_type: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guilds: Vec<String>,
}

impl CommandSchema {
    pub fn from_spec(spec: &CommandSpec) -> Self {
        CommandSchema {
            command_type: spec.command_type.code(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            options: spec
                .arguments
                .iter()
                .map(|argument| OptionSchema::from_argument(spec, None, argument))
                .collect(),
            permissions: spec.permissions(),
            roles: spec.roles(),
            channels: spec.channels.iter().cloned().collect(),
            guilds: spec.guilds.iter().cloned().collect(),
        }
    }

    /// Serializes the payload to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
