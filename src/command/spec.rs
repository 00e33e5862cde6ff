//! The frozen command declaration and its callback types.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    future::Future,
    sync::Arc,
};

use futures::{FutureExt, future::BoxFuture};

use crate::{
    command::{Argument, ArgumentKind, CommandType, DataType, Requirement, ScopeKey},
    interaction::{Invocation, Reply},
    resolve::{Arguments, Resolution},
    syntax::encode_payload,
    value::Value,
};

/// Future returned by a command action.
pub type ActionFuture = BoxFuture<'static, anyhow::Result<Reply>>;

/// Command action: receives the invocation, the resolved argument object and the
/// raw resolution, and produces the reply.
pub type ActionFn = Arc<dyn Fn(Invocation, Arguments, Resolution) -> ActionFuture + Send + Sync>;

/// Future returned by an autocomplete callback.
pub type AutocompleteFuture = BoxFuture<'static, anyhow::Result<Vec<String>>>;

/// Autocomplete callback: receives the partially typed value and the invocation,
/// and produces suggestions.
pub type AutocompleteFn = Arc<dyn Fn(String, Invocation) -> AutocompleteFuture + Send + Sync>;

/// Wraps an async closure into an [`ActionFn`].
pub fn action_fn<F, Fut>(action: F) -> ActionFn
where
    F: Fn(Invocation, Arguments, Resolution) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
{
    Arc::new(move |invocation, arguments, resolution| {
        action(invocation, arguments, resolution).boxed()
    })
}

/// Wraps an async closure into an [`AutocompleteFn`].
pub fn autocomplete_fn<F, Fut>(callback: F) -> AutocompleteFn
where
    F: Fn(String, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<String>>> + Send + 'static,
{
    Arc::new(move |partial, invocation| callback(partial, invocation).boxed())
}

pub(crate) fn noop_action() -> ActionFn {
    action_fn(|_, _, _| async { Ok(Reply::Silent) })
}

/// Where the permitted values of an argument come from.
///
/// Literal choices and autocomplete are mutually exclusive, so the caller picks
/// exactly one variant.
#[derive(Clone, Default)]
pub enum ChoiceSource {
    #[default]
    None,
    /// A fixed list of permitted values
    Literal(Vec<String>),
    /// Suggestions computed while the user types
    Dynamic(AutocompleteFn),
}

impl ChoiceSource {
    /// Creates a [`ChoiceSource::Literal`] from any list of strings.
    pub fn literal<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChoiceSource::Literal(choices.into_iter().map(Into::into).collect())
    }

    /// Creates a [`ChoiceSource::Dynamic`] from an async closure.
    pub fn dynamic<F, Fut>(callback: F) -> Self
    where
        F: Fn(String, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<String>>> + Send + 'static,
    {
        ChoiceSource::Dynamic(autocomplete_fn(callback))
    }
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceSource::None => write!(f, "None"),
            ChoiceSource::Literal(choices) => f.debug_tuple("Literal").field(choices).finish(),
            ChoiceSource::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

/// Extra per-argument options.
///
/// # Examples
///
/// ```
/// use slashkit::ArgumentOptions;
///
/// let options = ArgumentOptions::default().with_min(1.0).with_max(5.0).with_default(3i64);
/// assert_eq!(options.min, Some(1.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentOptions {
    /// Value used when an optional argument is absent
    pub default: Option<Value>,
    /// Lower bound, numeric arguments only
    pub min: Option<f64>,
    /// Upper bound, numeric arguments only
    pub max: Option<f64>,
}

impl ArgumentOptions {
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

/// A finalized command declaration.
///
/// Produced by [`SyntaxBuilder::build`](crate::SyntaxBuilder::build) and shared
/// behind an `Arc`; it is never mutated afterwards. Choices, defaults and
/// autocomplete callbacks are kept in maps keyed by [`ScopeKey`] so that two
/// subcommands may declare arguments with the same name.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    /// Empty for context menus
    pub description: String,
    /// Top-level arguments, subcommands included, in declaration order
    pub arguments: Vec<Argument>,
    pub command_type: CommandType,
    pub choices: HashMap<ScopeKey, Vec<String>>,
    pub autocomplete: HashMap<ScopeKey, AutocompleteFn>,
    pub defaults: HashMap<ScopeKey, Value>,
    pub requires: BTreeSet<Requirement>,
    pub channels: BTreeSet<String>,
    pub guilds: BTreeSet<String>,
    pub action: ActionFn,
}

impl CommandSpec {
    /// Returns the subcommand named `name`.
    pub fn subcommand(&self, name: &str) -> Option<&Argument> {
        self.subcommands().find(|argument| argument.name == name)
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|argument| argument.is_command())
    }

    pub fn has_subcommands(&self) -> bool {
        self.subcommands().next().is_some()
    }

    /// Returns every flag, top-level and per-subcommand.
    pub fn flags(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .flat_map(|argument| std::iter::once(argument).chain(argument.subarguments.iter()))
            .filter(|argument| argument.is_flag())
    }

    pub fn choices_for(&self, key: &ScopeKey) -> Option<&[String]> {
        self.choices.get(key).map(Vec::as_slice)
    }

    pub fn default_for(&self, key: &ScopeKey) -> Option<&Value> {
        self.defaults.get(key)
    }

    pub fn has_autocomplete(&self, key: &ScopeKey) -> bool {
        self.autocomplete.contains_key(key)
    }

    /// Names of the required permissions.
    pub fn permissions(&self) -> Vec<String> {
        self.requires
            .iter()
            .filter_map(|requirement| match requirement {
                Requirement::Permission(name) => Some(name.clone()),
                Requirement::Role(_) => None,
            })
            .collect()
    }

    /// Names of the required roles.
    pub fn roles(&self) -> Vec<String> {
        self.requires
            .iter()
            .filter_map(|requirement| match requirement {
                Requirement::Role(name) => Some(name.clone()),
                Requirement::Permission(_) => None,
            })
            .collect()
    }

    /// Renders one usage line per invocable shape.
    ///
    /// A command without subcommands has a single line; otherwise each subcommand
    /// gets its own line.
    ///
    /// # Examples
    ///
    /// ```
    /// use slashkit::command;
    ///
    /// let todo = command("todo", "Manage todos").unwrap()
    ///     .argument("add <item>", "Item to add").unwrap()
    ///     .argument("list (-a all)", "Show all").unwrap()
    ///     .action(|_, _, _| async { Ok(slashkit::Reply::Silent) })
    ///     .unwrap();
    /// assert_eq!(todo.spec().usage(), vec!["todo add <item>", "todo list (-a all)"]);
    /// ```
    pub fn usage(&self) -> Vec<String> {
        let (leading, trailing) = self.top_level_split();
        let render = |middle: Vec<String>| {
            std::iter::once(self.name.clone())
                .chain(leading.iter().map(|argument| argument.usage()))
                .chain(middle)
                .chain(trailing.iter().map(|argument| argument.usage()))
                .collect::<Vec<String>>()
                .join(" ")
        };

        if !self.has_subcommands() {
            return vec![render(Vec::new())];
        }

        self.subcommands()
            .map(|subcommand| {
                let middle = std::iter::once(subcommand.name.clone())
                    .chain(subcommand.subarguments.iter().map(Argument::usage))
                    .collect();
                render(middle)
            })
            .collect()
    }

    /// Splits the top-level parameters around the first subcommand.
    ///
    /// On the text strategy the subcommand name is expected right after the
    /// leading parameters, and the trailing ones follow its own parameters.
    pub(crate) fn top_level_split(&self) -> (Vec<&Argument>, Vec<&Argument>) {
        let first_command = self
            .arguments
            .iter()
            .position(Argument::is_command)
            .unwrap_or(self.arguments.len());

        let (leading, trailing) = self.arguments.split_at(first_command);
        (
            leading.iter().filter(|argument| !argument.is_command()).collect(),
            trailing.iter().filter(|argument| !argument.is_command()).collect(),
        )
    }

    /// Renders the declaration back into a whole-command syntax string.
    ///
    /// Names, datatypes, variadics, descriptions and literal choices survive;
    /// bounds, defaults, autocomplete and restrictions do not.
    pub fn to_syntax(&self) -> String {
        let mut fragments = vec![encode_payload(
            &self.name,
            Some(self.description.as_str()),
            None,
        )];

        for argument in self.arguments.iter().filter(|argument| !argument.is_command()) {
            fragments.push(self.fragment_syntax(None, argument));
        }
        for subcommand in self.subcommands() {
            fragments.push(encode_payload(
                &subcommand.name,
                Some(subcommand.description.as_str()),
                None,
            ));
            for argument in &subcommand.subarguments {
                fragments.push(self.fragment_syntax(Some(&subcommand.name), argument));
            }
        }

        fragments.join(" ")
    }

    fn fragment_syntax(&self, subcommand: Option<&str>, argument: &Argument) -> String {
        let key = ScopeKey::new(subcommand, &argument.name);
        let description = Some(argument.description.as_str());

        match argument.kind {
            ArgumentKind::Flag => {
                let head = format!(
                    "{} {}",
                    argument.flag_token.as_deref().unwrap_or_default(),
                    argument.name
                );
                format!("({})", encode_payload(&head, description, None))
            }
            _ => {
                let mut head = argument.name.clone();
                if argument.datatype != DataType::String {
                    head.push_str(&format!(": {}", argument.datatype));
                }
                if argument.variadic {
                    head.push_str("...");
                }
                let payload = encode_payload(&head, description, self.choices_for(&key));
                if argument.optional {
                    format!("[{payload}]")
                } else {
                    format!("<{payload}>")
                }
            }
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut autocomplete: Vec<String> = self.autocomplete.keys().map(ScopeKey::to_string).collect();
        autocomplete.sort();

        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("command_type", &self.command_type)
            .field("choices", &self.choices)
            .field("autocomplete", &autocomplete)
            .field("defaults", &self.defaults)
            .field("requires", &self.requires)
            .field("channels", &self.channels)
            .field("guilds", &self.guilds)
            .finish_non_exhaustive()
    }
}
