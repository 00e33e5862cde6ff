//! Order-sensitive command builder.
//!
//! The builder walks through `Empty → Named → Described → Populated → Built`.
//! Every mutator checks the state first, so calling them out of order fails at the
//! offending call with [`BuildError::PrematureCall`], [`BuildError::AlreadySet`] or
//! [`BuildError::Finalized`].

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info, warn};

use crate::{
    command::{
        Argument, ArgumentKind, BuildError, CommandType, Requirement, ScopeKey, is_permission,
        spec::{
            ActionFn, ArgumentOptions, AutocompleteFn, ChoiceSource, CommandSpec, noop_action,
        },
    },
    syntax::{Fragment, Grammar, SyntaxError, tokenize},
    value::Value,
};

/// Description used when a command, subcommand or argument has none.
pub const FILLER_DESCRIPTION: &str = "No description provided.";

fn filler_description(what: &str) -> String {
    warn!("no description provided for {}, using filler", what);
    FILLER_DESCRIPTION.to_owned()
}

/// Returns the description if it holds anything but whitespace.
fn non_blank(description: Option<&str>) -> Option<&str> {
    description.filter(|description| !description.trim().is_empty())
}

fn check_identifier(name: &str) -> Result<(), SyntaxError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(SyntaxError::malformed(
            name,
            "a name must be a single non-empty word",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Empty,
    Named,
    Described,
    Populated,
    Built,
}

/// Accumulates a command declaration and freezes it into a [`CommandSpec`].
///
/// # Examples
///
/// ```
/// use slashkit::{ArgumentOptions, ChoiceSource, SyntaxBuilder};
///
/// let mut builder = SyntaxBuilder::new();
/// builder.set_command("todo", Some("Manage todos")).unwrap();
/// builder
///     .add_argument("add <item...>", Some("Item"), ChoiceSource::None, ArgumentOptions::default())
///     .unwrap();
/// let spec = builder.build().unwrap();
/// assert_eq!(spec.subcommand("add").unwrap().subarguments[0].name, "item");
/// ```
pub struct SyntaxBuilder {
    state: BuilderState,
    name: Option<String>,
    description: Option<String>,
    command_type: CommandType,
    arguments: Vec<Argument>,
    /// Subcommand name to its index in `arguments`
    subcommands: HashMap<String, usize>,
    /// Subcommands created from an argument declaration, awaiting a description
    implicit: HashSet<String>,
    choices: HashMap<ScopeKey, Vec<String>>,
    autocomplete: HashMap<ScopeKey, AutocompleteFn>,
    defaults: HashMap<ScopeKey, Value>,
    requires: BTreeSet<Requirement>,
    channels: BTreeSet<String>,
    guilds: BTreeSet<String>,
    action: Option<ActionFn>,
    built: Option<Arc<CommandSpec>>,
}

impl Default for SyntaxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxBuilder {
    pub fn new() -> Self {
        SyntaxBuilder {
            state: BuilderState::Empty,
            name: None,
            description: None,
            command_type: CommandType::ChatInput,
            arguments: Vec::new(),
            subcommands: HashMap::new(),
            implicit: HashSet::new(),
            choices: HashMap::new(),
            autocomplete: HashMap::new(),
            defaults: HashMap::new(),
            requires: BTreeSet::new(),
            channels: BTreeSet::new(),
            guilds: BTreeSet::new(),
            action: None,
            built: None,
        }
    }

    /// Creates a builder from a whole-command syntax string.
    ///
    /// The first fragment names the command, later barewords open subcommands
    /// (subgroups are flattened into subcommands) and every other fragment is a
    /// parameter of the most recent subcommand, or of the command itself before
    /// the first one. Payload choices become literal choices.
    ///
    /// # Arguments
    ///
    /// * `syntax` - e.g. `anotha;+Another+test+command <req; An argument> [opt; Choice; A|B]`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Syntax`] when the string is malformed or does not
    /// start with the command name, and any error [`SyntaxBuilder::add_argument`]
    /// would raise for the same parameters.
    pub fn from_syntax(syntax: &str) -> Result<Self, BuildError> {
        let mut fragments = tokenize(syntax, Grammar::Legacy)?.into_iter();
        let mut builder = SyntaxBuilder::new();

        let root = match fragments.next() {
            Some(fragment) if fragment.argument.is_command() => fragment,
            Some(fragment) => {
                return Err(SyntaxError::malformed(
                    &fragment.source,
                    "a command syntax must start with the command name",
                )
                .into());
            }
            None => {
                return Err(SyntaxError::malformed(syntax, "empty command syntax").into());
            }
        };
        builder.set_command(
            &root.argument.name,
            non_blank(Some(root.argument.description.as_str())),
        )?;

        let mut scope = None;
        for fragment in fragments {
            if fragment.argument.is_command() {
                let description = non_blank(Some(fragment.argument.description.as_str()));
                scope = Some(builder.upsert_subcommand(
                    &fragment.argument.name,
                    description,
                    false,
                )?);
                continue;
            }

            let source = match &fragment.choices {
                Some(choices) => ChoiceSource::Literal(choices.clone()),
                None => ChoiceSource::None,
            };
            builder.insert_argument(scope, fragment, None, source, ArgumentOptions::default())?;
        }

        debug!(
            "compiled `{}` from syntax with {} top-level arguments",
            builder.name.as_deref().unwrap_or_default(),
            builder.arguments.len()
        );

        Ok(builder)
    }

    /// Checks that the command is named and not yet built.
    fn ensure_named(&self, operation: &'static str) -> Result<(), BuildError> {
        match self.state {
            BuilderState::Empty => Err(BuildError::PrematureCall(operation)),
            BuilderState::Built => Err(BuildError::Finalized),
            _ => Ok(()),
        }
    }

    /// Names the command, optionally describing it.
    ///
    /// # Errors
    ///
    /// * [`BuildError::AlreadySet`] - The command was already named
    /// * [`BuildError::Finalized`] - The builder was already built
    /// * [`BuildError::Syntax`] - The name is empty or contains whitespace
    pub fn set_command(&mut self, name: &str, description: Option<&str>) -> Result<(), BuildError> {
        match self.state {
            BuilderState::Empty => {}
            BuilderState::Built => return Err(BuildError::Finalized),
            _ => return Err(BuildError::AlreadySet("command name")),
        }
        check_identifier(name)?;

        self.name = Some(name.to_owned());
        self.state = BuilderState::Named;
        debug!("declaring command `{}`", name);

        if let Some(description) = description {
            self.set_description(description)?;
        }
        Ok(())
    }

    /// Describes the command. A blank description is ignored.
    ///
    /// # Errors
    ///
    /// * [`BuildError::AlreadySet`] - A description already exists
    /// * [`BuildError::PrematureCall`] - The command is not named yet
    pub fn set_description(&mut self, description: &str) -> Result<(), BuildError> {
        self.ensure_named("set a description")?;
        if description.trim().is_empty() {
            return Ok(());
        }
        if self.description.is_some() {
            return Err(BuildError::AlreadySet("description"));
        }

        self.description = Some(description.to_owned());
        if self.state == BuilderState::Named {
            self.state = BuilderState::Described;
        }
        Ok(())
    }

    /// Sets the command type, [`CommandType::ChatInput`] by default.
    pub fn set_type(&mut self, command_type: CommandType) -> Result<(), BuildError> {
        self.ensure_named("set the command type")?;
        self.command_type = command_type;
        Ok(())
    }

    /// Declares a subcommand with no parameters yet.
    ///
    /// Declaring a subcommand that an earlier [`SyntaxBuilder::add_argument`]
    /// call created implicitly only attaches the description.
    ///
    /// # Errors
    ///
    /// * [`BuildError::PrematureCall`] - The command is not named yet
    /// * [`BuildError::DuplicateArgument`] - The name is already declared at the top level
    pub fn add_subcommand(&mut self, name: &str, description: Option<&str>) -> Result<(), BuildError> {
        self.ensure_named("add a subcommand")?;
        check_identifier(name)?;
        self.upsert_subcommand(name, non_blank(description), false)?;
        self.state = BuilderState::Populated;
        Ok(())
    }

    /// Returns the index of the subcommand `name`, creating it when missing.
    ///
    /// An implicit upsert (from an argument declaration) reuses any existing
    /// subcommand. An explicit one fails on a subcommand that was itself declared
    /// explicitly.
    fn upsert_subcommand(
        &mut self,
        name: &str,
        description: Option<&str>,
        implicit: bool,
    ) -> Result<usize, BuildError> {
        if let Some(&index) = self.subcommands.get(name) {
            if implicit {
                // A later description wins until the subcommand is declared explicitly
                if let Some(description) = description.filter(|_| self.implicit.contains(name)) {
                    self.arguments[index].description = description.to_owned();
                }
                return Ok(index);
            }
            if !self.implicit.remove(name) {
                return Err(BuildError::DuplicateArgument(ScopeKey::top(name)));
            }
            if let Some(description) = description {
                self.arguments[index].description = description.to_owned();
            }
            return Ok(index);
        }

        if self.arguments.iter().any(|argument| argument.name == name) {
            return Err(BuildError::DuplicateArgument(ScopeKey::top(name)));
        }

        let description = match description {
            Some(description) => description.to_owned(),
            None => filler_description(&format!("subcommand `{name}`")),
        };
        if implicit {
            info!(
                "implicitly creating subcommand `{}` of `{}`",
                name,
                self.name.as_deref().unwrap_or_default()
            );
            self.implicit.insert(name.to_owned());
        }

        self.arguments.push(Argument::subcommand(name, &description));
        let index = self.arguments.len() - 1;
        self.subcommands.insert(name.to_owned(), index);
        Ok(index)
    }

    /// Declares one parameter from an argument syntax string.
    ///
    /// The syntax holds exactly one parameter fragment, optionally preceded by a
    /// subcommand bareword (`"add <item>"`), in which case the parameter is scoped
    /// under that subcommand, creating it when it does not exist yet.
    ///
    /// # Arguments
    ///
    /// * `syntax` - Argument syntax, e.g. `[count: integer; How many]`
    /// * `description` - Takes precedence over the payload description
    /// * `source` - Literal choices or autocomplete; a literal list replaces payload choices
    /// * `options` - Default value and numeric bounds
    ///
    /// # Errors
    ///
    /// * [`BuildError::Syntax`] - The syntax is malformed or holds more than one parameter
    /// * [`BuildError::InvalidConstraint`] - Bounds on a non-numeric argument, or `min > max`
    /// * [`BuildError::DuplicateArgument`] - The name is already taken in its scope
    /// * [`BuildError::ConflictingChoiceSource`] - Autocomplete combined with payload
    ///   choices, or any choice source on a flag
    pub fn add_argument(
        &mut self,
        syntax: &str,
        description: Option<&str>,
        source: ChoiceSource,
        options: ArgumentOptions,
    ) -> Result<(), BuildError> {
        self.ensure_named("add an argument")?;

        let (commands, mut parameters): (Vec<Fragment>, Vec<Fragment>) =
            tokenize(syntax, Grammar::Strict)?
                .into_iter()
                .partition(|fragment| fragment.argument.is_command());

        if parameters.len() != 1 {
            return Err(SyntaxError::malformed(
                syntax,
                "an argument declaration holds exactly one parameter",
            )
            .into());
        }
        if commands.len() > 1 {
            return Err(
                SyntaxError::malformed(syntax, "nested subcommand groups are not supported").into(),
            );
        }

        let parameter = parameters.remove(0);
        let created = commands
            .first()
            .filter(|command| !self.subcommands.contains_key(&command.argument.name))
            .map(|command| command.argument.name.clone());
        let scope = match commands.first() {
            Some(command) if command.position > parameter.position => {
                return Err(SyntaxError::malformed(
                    syntax,
                    "the subcommand must precede the parameter",
                )
                .into());
            }
            Some(command) => {
                let payload_description = non_blank(Some(command.argument.description.as_str()));
                Some(self.upsert_subcommand(&command.argument.name, payload_description, true)?)
            }
            None => None,
        };

        let result = self.insert_argument(scope, parameter, description, source, options);
        if let (Err(_), Some(name)) = (&result, created) {
            self.discard_subcommand(&name);
        }
        result
    }

    /// Removes a subcommand created implicitly by a declaration that failed.
    fn discard_subcommand(&mut self, name: &str) {
        if let Some(index) = self.subcommands.remove(name) {
            self.arguments.remove(index);
            self.implicit.remove(name);
            debug!("discarded subcommand `{}` of a rejected declaration", name);
        }
    }

    /// Validates one parsed parameter and stores it in its scope.
    fn insert_argument(
        &mut self,
        scope: Option<usize>,
        fragment: Fragment,
        description: Option<&str>,
        source: ChoiceSource,
        options: ArgumentOptions,
    ) -> Result<(), BuildError> {
        let mut argument = fragment.argument;
        let subcommand = scope.map(|index| self.arguments[index].name.clone());
        let key = ScopeKey::new(subcommand.as_deref(), &argument.name);

        let taken = match scope {
            Some(index) => &self.arguments[index].subarguments,
            None => &self.arguments,
        };
        if taken.iter().any(|existing| existing.name == argument.name) {
            return Err(BuildError::DuplicateArgument(key));
        }

        let payload_description = non_blank(Some(argument.description.as_str()));
        argument.description = match non_blank(description).or(payload_description) {
            Some(description) => description.to_owned(),
            None => filler_description(&format!("argument `{key}`")),
        };

        if options.min.is_some() || options.max.is_some() {
            if !argument.datatype.is_numeric() {
                return Err(BuildError::InvalidConstraint {
                    argument: key.to_string(),
                    reason: format!("bounds require a numeric type, found {}", argument.datatype),
                });
            }
            if let (Some(min), Some(max)) = (options.min, options.max) {
                if min > max {
                    return Err(BuildError::InvalidConstraint {
                        argument: key.to_string(),
                        reason: format!("min {min} is greater than max {max}"),
                    });
                }
            }
            argument.min = options.min;
            argument.max = options.max;
        }

        if argument.kind == ArgumentKind::Flag {
            if !matches!(source, ChoiceSource::None) || fragment.choices.is_some() {
                return Err(BuildError::ConflictingChoiceSource(key));
            }
            let token = argument.flag_token.clone().unwrap_or_default();
            self.choices.insert(key.clone(), vec![token]);
        } else {
            match source {
                ChoiceSource::Literal(choices) => {
                    self.choices.insert(key.clone(), choices);
                }
                ChoiceSource::Dynamic(callback) => {
                    if fragment.choices.is_some() {
                        return Err(BuildError::ConflictingChoiceSource(key));
                    }
                    self.autocomplete.insert(key.clone(), callback);
                }
                ChoiceSource::None => {
                    if let Some(choices) = fragment.choices {
                        self.choices.insert(key.clone(), choices);
                    }
                }
            }
        }

        if let Some(default) = options.default {
            if argument.kind == ArgumentKind::Flag {
                warn!("ignoring default of flag `{}`, flags have no default", key);
            } else if argument.optional {
                self.defaults.insert(key.clone(), default);
            } else {
                warn!("ignoring default of required argument `{}`", key);
            }
        }

        debug!("declared argument `{}` as {}", key, argument.usage());

        match scope {
            Some(index) => self.arguments[index].subarguments.push(argument),
            None => self.arguments.push(argument),
        }
        self.state = BuilderState::Populated;
        Ok(())
    }

    /// Requires a permission or a role of the invoking member.
    ///
    /// A known permission identifier (see [`is_permission`]) is a permission and
    /// anything else a role. A leading `@` always denotes a role and is stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use slashkit::{Requirement, SyntaxBuilder};
    ///
    /// let mut builder = SyntaxBuilder::new();
    /// builder.set_command("ban", None).unwrap();
    /// builder.add_require("ADMINISTRATOR").unwrap();
    /// builder.add_require("@Bot").unwrap();
    /// let spec = builder.build().unwrap();
    /// assert!(spec.requires.contains(&Requirement::Permission("ADMINISTRATOR".into())));
    /// assert!(spec.requires.contains(&Requirement::Role("Bot".into())));
    /// ```
    pub fn add_require(&mut self, token: &str) -> Result<(), BuildError> {
        self.ensure_named("add a requirement")?;

        let token = token.trim();
        let requirement = match token.strip_prefix('@') {
            Some(role) => Requirement::Role(role.to_owned()),
            None if is_permission(token) => Requirement::Permission(token.to_uppercase()),
            None => Requirement::Role(token.to_owned()),
        };
        if matches!(&requirement, Requirement::Role(role) if role.is_empty()) {
            warn!("ignoring empty requirement");
            return Ok(());
        }

        self.requires.insert(requirement);
        Ok(())
    }

    /// Restricts the command to a channel.
    pub fn add_channel(&mut self, channel_id: &str) -> Result<(), BuildError> {
        self.ensure_named("add a channel")?;
        self.channels.insert(channel_id.to_owned());
        Ok(())
    }

    /// Restricts the command to a guild.
    pub fn add_guild(&mut self, guild_id: &str) -> Result<(), BuildError> {
        self.ensure_named("add a guild")?;
        self.guilds.insert(guild_id.to_owned());
        Ok(())
    }

    pub fn set_action(&mut self, action: ActionFn) -> Result<(), BuildError> {
        self.ensure_named("set the action")?;
        if self.action.is_some() {
            return Err(BuildError::AlreadySet("action"));
        }
        self.action = Some(action);
        Ok(())
    }

    /// Freezes the declaration.
    ///
    /// Repeated calls return the same [`CommandSpec`]; every mutator fails with
    /// [`BuildError::Finalized`] afterwards. A missing action becomes a handler
    /// replying nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PrematureCall`] when the command was never named.
    pub fn build(&mut self) -> Result<Arc<CommandSpec>, BuildError> {
        if let Some(spec) = &self.built {
            return Ok(Arc::clone(spec));
        }
        let Some(name) = self.name.clone() else {
            return Err(BuildError::PrematureCall("build"));
        };

        let description = match (&self.description, self.command_type.is_context_menu()) {
            (_, true) => String::new(),
            (Some(description), false) => description.clone(),
            (None, false) => filler_description(&format!("command `{name}`")),
        };
        let action = match self.action.take() {
            Some(action) => action,
            None => {
                warn!("command `{}` has no action, it will reply nothing", name);
                noop_action()
            }
        };

        let spec = Arc::new(CommandSpec {
            name,
            description,
            arguments: std::mem::take(&mut self.arguments),
            command_type: self.command_type,
            choices: std::mem::take(&mut self.choices),
            autocomplete: std::mem::take(&mut self.autocomplete),
            defaults: std::mem::take(&mut self.defaults),
            requires: std::mem::take(&mut self.requires),
            channels: std::mem::take(&mut self.channels),
            guilds: std::mem::take(&mut self.guilds),
            action,
        });

        info!("built command `{}`", spec.name);
        self.state = BuilderState::Built;
        self.built = Some(Arc::clone(&spec));
        Ok(spec)
    }
}
