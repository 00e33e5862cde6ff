//! Chaining wrappers over [`SyntaxBuilder`].
//!
//! Each call consumes the wrapper and hands it back, so a declaration reads as one
//! expression ending in `.action(..)`:
//!
//! ```
//! use slashkit::{Reply, command};
//!
//! let ping = command("ping", "Check the bot is alive")?
//!     .argument("[message; Echoed back]", None)?
//!     .require("SEND_MESSAGES")?
//!     .action(|_, arguments, _| async move {
//!         let message = arguments.get_str("message").unwrap_or("pong").to_owned();
//!         Ok(Reply::Message(message))
//!     })?;
//! assert_eq!(ping.name(), "ping");
//! # Ok::<(), slashkit::BuildError>(())
//! ```

use std::{future::Future, sync::Arc};

use crate::{
    adapter::CommandSchema,
    command::{
        BuildError, CommandSpec, CommandType, SyntaxBuilder,
        spec::{ArgumentOptions, ChoiceSource, action_fn},
    },
    interaction::{Invocation, Reply},
    resolve::{Arguments, Resolution},
};

/// Starts a chat-input command declaration.
///
/// # Errors
///
/// Returns [`BuildError::Syntax`] when `name` is empty or contains whitespace.
pub fn command<'a>(
    name: &str,
    description: impl Into<Option<&'a str>>,
) -> Result<SyntaxCommand, BuildError> {
    let mut builder = SyntaxBuilder::new();
    builder.set_command(name, description.into())?;
    Ok(SyntaxCommand { builder })
}

/// Starts a declaration from a whole-command syntax string.
///
/// See [`SyntaxBuilder::from_syntax`].
pub fn syntax_command(syntax: &str) -> Result<SyntaxCommand, BuildError> {
    Ok(SyntaxCommand {
        builder: SyntaxBuilder::from_syntax(syntax)?,
    })
}

/// Starts a context menu declaration, targeting users unless [`SyntaxContextMenu::kind`]
/// says otherwise.
pub fn context_menu(name: &str) -> Result<SyntaxContextMenu, BuildError> {
    let mut builder = SyntaxBuilder::new();
    builder.set_command(name, None)?;
    builder.set_type(CommandType::User)?;
    Ok(SyntaxContextMenu { builder })
}

/// Fluent chat-input command declaration.
pub struct SyntaxCommand {
    builder: SyntaxBuilder,
}

impl SyntaxCommand {
    pub fn description(mut self, description: &str) -> Result<Self, BuildError> {
        self.builder.set_description(description)?;
        Ok(self)
    }

    pub fn subcommand<'a>(
        mut self,
        name: &str,
        description: impl Into<Option<&'a str>>,
    ) -> Result<Self, BuildError> {
        self.builder.add_subcommand(name, description.into())?;
        Ok(self)
    }

    /// Declares several subcommands as `(name, description)` pairs.
    pub fn subcommands<'a, I>(self, subcommands: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        subcommands
            .into_iter()
            .try_fold(self, |command, (name, description)| {
                command.subcommand(name, description)
            })
    }

    /// Declares one parameter without a choice source or options.
    ///
    /// See [`SyntaxBuilder::add_argument`] for the accepted syntax.
    pub fn argument<'a>(
        self,
        syntax: &str,
        description: impl Into<Option<&'a str>>,
    ) -> Result<Self, BuildError> {
        self.argument_with(
            syntax,
            description,
            ChoiceSource::None,
            ArgumentOptions::default(),
        )
    }

    /// Declares one parameter with a choice source and options.
    pub fn argument_with<'a>(
        mut self,
        syntax: &str,
        description: impl Into<Option<&'a str>>,
        source: ChoiceSource,
        options: ArgumentOptions,
    ) -> Result<Self, BuildError> {
        self.builder
            .add_argument(syntax, description.into(), source, options)?;
        Ok(self)
    }

    /// Declares several parameters as `(syntax, description)` pairs.
    pub fn arguments<'a, I>(self, arguments: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        arguments
            .into_iter()
            .try_fold(self, |command, (syntax, description)| {
                command.argument(syntax, description)
            })
    }

    pub fn require(mut self, permission_or_role: &str) -> Result<Self, BuildError> {
        self.builder.add_require(permission_or_role)?;
        Ok(self)
    }

    pub fn requires<'a, I>(self, requirements: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        requirements.into_iter().try_fold(self, Self::require)
    }

    pub fn channel(mut self, channel_id: &str) -> Result<Self, BuildError> {
        self.builder.add_channel(channel_id)?;
        Ok(self)
    }

    pub fn channels<'a, I>(self, channel_ids: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        channel_ids.into_iter().try_fold(self, Self::channel)
    }

    pub fn guild(mut self, guild_id: &str) -> Result<Self, BuildError> {
        self.builder.add_guild(guild_id)?;
        Ok(self)
    }

    pub fn guilds<'a, I>(self, guild_ids: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        guild_ids.into_iter().try_fold(self, Self::guild)
    }

    /// Binds the action and freezes the declaration.
    pub fn action<F, Fut>(mut self, action: F) -> Result<FinalizedCommand, BuildError>
    where
        F: Fn(Invocation, Arguments, Resolution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.builder.set_action(action_fn(action))?;
        self.build()
    }

    /// Freezes the declaration without an action; invoking it replies nothing.
    pub fn build(mut self) -> Result<FinalizedCommand, BuildError> {
        let spec = self.builder.build()?;
        Ok(FinalizedCommand { spec })
    }
}

/// Fluent context menu declaration.
///
/// Context menus carry no description and no parameters: their arguments are
/// the target entries the platform supplies.
pub struct SyntaxContextMenu {
    builder: SyntaxBuilder,
}

impl SyntaxContextMenu {
    /// Sets the target type, `user` or `message`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidMenuType`] for any other value.
    pub fn kind(mut self, kind: &str) -> Result<Self, BuildError> {
        let command_type = match kind.trim().to_lowercase().as_str() {
            "user" => CommandType::User,
            "message" => CommandType::Message,
            _ => return Err(BuildError::InvalidMenuType(kind.to_owned())),
        };
        self.builder.set_type(command_type)?;
        Ok(self)
    }

    pub fn require(mut self, permission_or_role: &str) -> Result<Self, BuildError> {
        self.builder.add_require(permission_or_role)?;
        Ok(self)
    }

    pub fn channel(mut self, channel_id: &str) -> Result<Self, BuildError> {
        self.builder.add_channel(channel_id)?;
        Ok(self)
    }

    pub fn guild(mut self, guild_id: &str) -> Result<Self, BuildError> {
        self.builder.add_guild(guild_id)?;
        Ok(self)
    }

    pub fn action<F, Fut>(mut self, action: F) -> Result<FinalizedCommand, BuildError>
    where
        F: Fn(Invocation, Arguments, Resolution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.builder.set_action(action_fn(action))?;
        let spec = self.builder.build()?;
        Ok(FinalizedCommand { spec })
    }
}

/// A built command, ready to be registered.
#[derive(Debug, Clone)]
pub struct FinalizedCommand {
    spec: Arc<CommandSpec>,
}

impl FinalizedCommand {
    pub fn spec(&self) -> &Arc<CommandSpec> {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Registration payload of the command.
    pub fn schema(&self) -> CommandSchema {
        CommandSchema::from_spec(&self.spec)
    }

    pub fn into_spec(self) -> Arc<CommandSpec> {
        self.spec
    }
}

impl From<FinalizedCommand> for Arc<CommandSpec> {
    fn from(command: FinalizedCommand) -> Self {
        command.spec
    }
}
