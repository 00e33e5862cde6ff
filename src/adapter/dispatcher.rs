//! Routing of invocations to registered commands.

use std::{
    collections::BTreeMap,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use anyhow::Context;
use futures::FutureExt;
use log::{debug, error, info, warn};

use crate::{
    adapter::{
        AutocompleteRegistry, CommandParseError, CommandSchema, Platform,
        responses::{
            format_dispatch_failure, format_help, format_not_available, format_unknown_command,
        },
    },
    command::{CommandSpec, ScopeKey},
    interaction::{Invocation, Reply},
    resolve::{Arguments, resolve},
};

/// Platforms show at most this many suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Registers commands with a platform and dispatches invocations to them.
///
/// # Examples
///
/// ```no_run
/// # use slashkit::{Dispatcher, Invocation, Reply, command, adapter::MockPlatform};
/// # async fn example() -> anyhow::Result<()> {
/// let mut dispatcher = Dispatcher::new(MockPlatform::new(), "!");
/// dispatcher
///     .register(command("ping", "Ping")?.action(|_, _, _| async { Ok(Reply::message("pong")) })?)
///     .await?;
///
/// let reply = dispatcher.dispatch(Invocation::new("ping", "42")).await?;
/// assert_eq!(reply, Reply::message("pong"));
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<P: Platform> {
    platform: P,
    registry: AutocompleteRegistry,
    commands: BTreeMap<String, Arc<CommandSpec>>,
    /// Prefix of text commands, e.g. `!`
    prefix: String,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(platform: P, prefix: &str) -> Self {
        Self::with_registry(platform, prefix, AutocompleteRegistry::new())
    }

    /// Creates a dispatcher publishing autocomplete callbacks to `registry`.
    pub fn with_registry(platform: P, prefix: &str, registry: AutocompleteRegistry) -> Self {
        Dispatcher {
            platform,
            registry,
            commands: BTreeMap::new(),
            prefix: prefix.to_owned(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn registry(&self) -> &AutocompleteRegistry {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn command(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        self.commands.get(name)
    }

    /// Registered commands, sorted by name.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<CommandSpec>> {
        self.commands.values()
    }

    /// Registers a built command.
    ///
    /// The schema is sent to the platform first; only once it is accepted are the
    /// autocomplete callbacks published and the command made dispatchable. A
    /// command registered again under the same name replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform rejects the registration.
    pub async fn register(&mut self, command: impl Into<Arc<CommandSpec>>) -> anyhow::Result<()> {
        let spec: Arc<CommandSpec> = command.into();
        let schema = CommandSchema::from_spec(&spec);

        self.platform
            .register_command(&schema)
            .await
            .with_context(|| format!("failed to register command `{}`", spec.name))?;
        self.registry.publish(&spec).await;

        info!("registered command `{}`", spec.name);
        if self.commands.insert(spec.name.clone(), spec).is_some() {
            warn!("replaced an earlier command with the same name");
        }
        Ok(())
    }

    /// Dispatches an invocation and sends the reply.
    ///
    /// Resolution errors, action errors and panics are logged and answered with
    /// a generic ephemeral failure: a bad dispatch never takes the process down.
    ///
    /// # Returns
    ///
    /// The reply that was sent, [`Reply::Silent`] when nothing was.
    ///
    /// # Errors
    ///
    /// Returns an error only when the platform fails to send the reply.
    pub async fn dispatch(&self, invocation: Invocation) -> anyhow::Result<Reply> {
        let reply = match self.commands.get(&invocation.command_name) {
            Some(spec) if !is_available(spec, &invocation) => {
                debug!(
                    "command `{}` used outside its channels or guilds",
                    spec.name
                );
                Reply::ephemeral(format_not_available(&spec.name))
            }
            Some(spec) => execute(spec, invocation.clone()).await,
            None => {
                warn!("invocation of unknown command `{}`", invocation.command_name);
                Reply::ephemeral(format_unknown_command(&self.prefix, &invocation.command_name))
            }
        };

        if reply != Reply::Silent {
            self.platform.respond(&invocation, &reply).await?;
        }
        Ok(reply)
    }

    /// Parses a text message into an invocation.
    ///
    /// `template` carries the user, channel and guild of the message.
    ///
    /// # Errors
    ///
    /// * [`CommandParseError::NotForBot`] - The message does not start with the prefix
    /// * [`CommandParseError::UnknownCommand`] - No command has that name
    pub fn parse_message(
        &self,
        body: &str,
        template: &Invocation,
    ) -> Result<Invocation, CommandParseError> {
        let rest = body
            .trim()
            .strip_prefix(&self.prefix)
            .ok_or(CommandParseError::NotForBot)?;

        let (name, raw) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if name.is_empty() {
            return Err(CommandParseError::NotForBot);
        }
        if !self.commands.contains_key(name) {
            return Err(CommandParseError::UnknownCommand(name.to_owned()));
        }

        Ok(Invocation {
            command_name: name.to_owned(),
            subcommand: None,
            options: Default::default(),
            target: Default::default(),
            focused: None,
            raw: Some(raw.trim().to_owned()),
            ..template.clone()
        })
    }

    /// Handles a text message: dispatches it when it invokes a command, answers
    /// `help` and unknown commands, and ignores everything else.
    ///
    /// # Returns
    ///
    /// `None` when the message was not addressed to the bot.
    pub async fn handle_message(
        &self,
        body: &str,
        template: &Invocation,
    ) -> anyhow::Result<Option<Reply>> {
        match self.parse_message(body, template) {
            Ok(invocation) => self.dispatch(invocation).await.map(Some),
            Err(CommandParseError::NotForBot) => {
                debug!("ignoring message not addressed to the bot");
                Ok(None)
            }
            Err(CommandParseError::UnknownCommand(name)) => {
                let reply = if name == "help" {
                    Reply::message(self.help())
                } else {
                    Reply::ephemeral(format_unknown_command(&self.prefix, &name))
                };
                let invocation = Invocation {
                    command_name: name,
                    ..template.clone()
                };
                self.platform.respond(&invocation, &reply).await?;
                Ok(Some(reply))
            }
        }
    }

    /// Answers an autocomplete request with the focused argument's suggestions.
    ///
    /// Arguments without a callback, and callbacks that fail, get no suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error when the request has no focused option or when the
    /// platform fails to send the suggestions.
    pub async fn autocomplete(&self, invocation: &Invocation) -> anyhow::Result<Vec<String>> {
        let focused = invocation
            .focused
            .as_deref()
            .context("autocomplete request without a focused option")?;
        let key = ScopeKey::new(invocation.subcommand.as_deref(), focused);

        let mut suggestions = match self.registry.callback(&invocation.command_name, &key).await {
            Some(callback) => {
                let partial = invocation.focused_value().unwrap_or_default();
                match callback(partial, invocation.clone()).await {
                    Ok(suggestions) => suggestions,
                    Err(e) => {
                        error!(
                            "autocomplete of `{}` in `{}` failed: {:#}",
                            key, invocation.command_name, e
                        );
                        Vec::new()
                    }
                }
            }
            None => {
                debug!(
                    "no autocomplete callback for `{}` in `{}`",
                    key, invocation.command_name
                );
                Vec::new()
            }
        };
        suggestions.truncate(MAX_SUGGESTIONS);

        self.platform
            .respond_autocomplete(invocation, suggestions.clone())
            .await?;
        Ok(suggestions)
    }

    /// Formats the help message of every registered command.
    pub fn help(&self) -> String {
        let specs: Vec<Arc<CommandSpec>> = self.commands.values().cloned().collect();
        format_help(&self.prefix, &specs)
    }
}

/// Returns `true` when the invocation comes from an allowed channel and guild.
fn is_available(spec: &CommandSpec, invocation: &Invocation) -> bool {
    let allowed = |set: &std::collections::BTreeSet<String>, id: &Option<String>| {
        set.is_empty() || id.as_ref().is_some_and(|id| set.contains(id))
    };
    allowed(&spec.channels, &invocation.channel_id) && allowed(&spec.guilds, &invocation.guild_id)
}

/// Resolves the invocation and runs the action, turning every failure into the
/// generic failure reply.
async fn execute(spec: &CommandSpec, invocation: Invocation) -> Reply {
    let resolution = match resolve(spec, &invocation) {
        Ok(resolution) => resolution,
        Err(e) => {
            error!("cannot resolve `{}`: {}", spec.name, e);
            return Reply::ephemeral(format_dispatch_failure());
        }
    };
    let arguments = Arguments::from_resolution(&resolution);

    debug!("running `{}` with {}", spec.name, arguments.to_json());
    let action = AssertUnwindSafe(async { (spec.action)(invocation, arguments, resolution).await });

    match action.catch_unwind().await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            error!("command `{}` failed: {:#}", spec.name, e);
            Reply::ephemeral(format_dispatch_failure())
        }
        Err(_) => {
            error!("command `{}` panicked", spec.name);
            Reply::ephemeral(format_dispatch_failure())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        adapter::MockPlatform,
        command::{ArgumentOptions, ChoiceSource, FinalizedCommand, command, context_menu},
        value::Value,
    };

    fn accepting_platform() -> MockPlatform {
        let mut platform = MockPlatform::new();
        platform.expect_register_command().returning(|_| Ok(()));
        platform
    }

    fn echo() -> FinalizedCommand {
        command("echo", "Echo the input")
            .unwrap()
            .argument("<words...>", None)
            .unwrap()
            .argument("(-u upper)", None)
            .unwrap()
            .action(|_, arguments, _| async move {
                let words = arguments.get_list("words").unwrap_or_default().join(" ");
                if arguments.flag("upper") {
                    return Ok(Reply::message(words.to_uppercase()));
                }
                Ok(Reply::message(words))
            })
            .unwrap()
    }

    fn template() -> Invocation {
        Invocation {
            channel_id: Some("room".to_owned()),
            ..Invocation::new("", "42")
        }
    }

    #[tokio::test]
    async fn test_register_sends_schema() {
        let mut platform = MockPlatform::new();
        platform
            .expect_register_command()
            .withf(|schema| schema.name == "echo" && schema.options.len() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        dispatcher.register(echo()).await.unwrap();
        assert!(dispatcher.command("echo").is_some());
    }

    #[tokio::test]
    async fn test_register_failure() {
        let mut platform = MockPlatform::new();
        platform
            .expect_register_command()
            .returning(|_| Err(anyhow::anyhow!("rate limited")));

        let mut dispatcher = Dispatcher::new(platform, "!");
        let error = dispatcher.register(echo()).await.unwrap_err();
        assert!(error.to_string().contains("`echo`"));
        assert!(dispatcher.command("echo").is_none());
    }

    #[tokio::test]
    async fn test_handle_text_message() {
        let mut platform = accepting_platform();
        platform
            .expect_respond()
            .withf(|invocation, reply| {
                invocation.command_name == "echo"
                    && invocation.channel_id.as_deref() == Some("room")
                    && *reply == Reply::message("HELLO WORLD")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        dispatcher.register(echo()).await.unwrap();

        let reply = dispatcher
            .handle_message("!echo hello world -u", &template())
            .await
            .unwrap();
        assert_eq!(reply, Some(Reply::message("HELLO WORLD")));
    }

    #[tokio::test]
    async fn test_ignores_chatter() {
        // No respond expectation: any reply would fail the test
        let mut dispatcher = Dispatcher::new(accepting_platform(), "!");
        dispatcher.register(echo()).await.unwrap();

        for body in ["hello there", "?echo hi", "!", "! echo"] {
            let reply = dispatcher.handle_message(body, &template()).await.unwrap();
            assert_eq!(reply, None, "{body} should be ignored");
        }
    }

    #[tokio::test]
    async fn test_unknown_command_and_help() {
        let mut platform = accepting_platform();
        platform.expect_respond().times(2).returning(|_, _| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        dispatcher.register(echo()).await.unwrap();

        let reply = dispatcher.handle_message("!nope", &template()).await.unwrap();
        assert_eq!(
            reply,
            Some(Reply::ephemeral(format_unknown_command("!", "nope")))
        );

        let reply = dispatcher.handle_message("!help", &template()).await.unwrap();
        let help = reply.unwrap();
        assert!(help.content().unwrap().contains("`!echo <words...> (-u upper)`"));
    }

    #[test]
    fn test_parse_message() {
        let dispatcher = Dispatcher::new(MockPlatform::new(), "!");
        assert_eq!(
            dispatcher.parse_message("just chatting", &template()),
            Err(CommandParseError::NotForBot)
        );
        assert_eq!(
            dispatcher.parse_message("!echo hi", &template()),
            Err(CommandParseError::UnknownCommand("echo".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_structured_dispatch() {
        let mut platform = accepting_platform();
        platform.expect_respond().times(1).returning(|_, _| Ok(()));

        let add = command("todo", "Manage todos")
            .unwrap()
            .argument("add <item>", None)
            .unwrap()
            .argument_with(
                "add [priority: integer]",
                None,
                ChoiceSource::None,
                ArgumentOptions::default().with_default(3i64),
            )
            .unwrap()
            .action(|_, arguments, _| async move {
                Ok(Reply::message(format!(
                    "{} {} {}",
                    arguments.subcommand().unwrap_or_default(),
                    arguments.get_str("item").unwrap_or_default(),
                    arguments.get_i64("priority").unwrap_or_default()
                )))
            })
            .unwrap();

        let mut dispatcher = Dispatcher::new(platform, "/");
        dispatcher.register(add).await.unwrap();

        let invocation = Invocation::new("todo", "42")
            .with_subcommand("add")
            .with_option("item", Value::from("milk"));
        let reply = dispatcher.dispatch(invocation).await.unwrap();
        assert_eq!(reply, Reply::message("add milk 3"));
    }

    #[tokio::test]
    async fn test_failures_become_generic_reply() {
        let mut platform = accepting_platform();
        platform
            .expect_respond()
            .withf(|_, reply| *reply == Reply::ephemeral(format_dispatch_failure()))
            .times(3)
            .returning(|_, _| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        let failing = command("fail", "Always fails")
            .unwrap()
            .action(|_, _, _| async { Err(anyhow::anyhow!("boom")) })
            .unwrap();
        let panicking = command("panic", "Always panics")
            .unwrap()
            .action(|_, arguments, _| async move {
                let missing = arguments.get_list("missing").expect("no such argument");
                Ok(Reply::message(missing.join(" ")))
            })
            .unwrap();
        let nested = command("nested", "Has subcommands")
            .unwrap()
            .argument("add <item>", None)
            .unwrap()
            .build()
            .unwrap();
        dispatcher.register(failing).await.unwrap();
        dispatcher.register(panicking).await.unwrap();
        dispatcher.register(nested).await.unwrap();

        for invocation in [
            Invocation::new("fail", "42"),
            Invocation::new("panic", "42"),
            Invocation::new("nested", "42").with_subcommand("rename"),
        ] {
            let reply = dispatcher.dispatch(invocation).await.unwrap();
            assert_eq!(reply, Reply::ephemeral(format_dispatch_failure()));
        }
    }

    #[tokio::test]
    async fn test_silent_reply_is_not_sent() {
        let mut dispatcher = Dispatcher::new(accepting_platform(), "!");
        dispatcher
            .register(command("quiet", "Says nothing").unwrap().build().unwrap())
            .await
            .unwrap();

        let reply = dispatcher.dispatch(Invocation::new("quiet", "42")).await.unwrap();
        assert_eq!(reply, Reply::Silent);
    }

    #[tokio::test]
    async fn test_restricted_channel() {
        let mut platform = accepting_platform();
        platform.expect_respond().times(2).returning(|_, _| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        let local = command("local", "Only in one room")
            .unwrap()
            .channel("room")
            .unwrap()
            .action(|_, _, _| async { Ok(Reply::message("hi")) })
            .unwrap();
        dispatcher.register(local).await.unwrap();

        let inside = Invocation {
            command_name: "local".to_owned(),
            ..template()
        };
        assert_eq!(dispatcher.dispatch(inside).await.unwrap(), Reply::message("hi"));

        let outside = Invocation::new("local", "42");
        assert_eq!(
            dispatcher.dispatch(outside).await.unwrap(),
            Reply::ephemeral(format_not_available("local"))
        );
    }

    #[tokio::test]
    async fn test_context_menu_dispatch() {
        let mut platform = accepting_platform();
        platform.expect_respond().times(1).returning(|_, _| Ok(()));

        let mut dispatcher = Dispatcher::new(platform, "!");
        let menu = context_menu("Inspect")
            .unwrap()
            .kind("message")
            .unwrap()
            .action(|_, arguments, _| async move {
                Ok(Reply::ephemeral(arguments.to_json().to_string()))
            })
            .unwrap();
        dispatcher.register(menu).await.unwrap();

        let invocation = Invocation::new("Inspect", "42")
            .with_target("message", Value::from("hello"))
            .with_target("null", Value::from("skipped"));
        let reply = dispatcher.dispatch(invocation).await.unwrap();
        let content = reply.content().unwrap();
        assert!(content.contains("\"message\":\"hello\""));
        assert!(!content.contains("skipped"));
    }

    #[tokio::test]
    async fn test_autocomplete() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&received);

        let mut platform = accepting_platform();
        platform
            .expect_respond_autocomplete()
            .returning(move |_, choices| {
                seen.lock().unwrap().push(choices);
                Ok(())
            });

        let items = ["milk", "bread", "mint tea"];
        let todo = command("todo", "Manage todos")
            .unwrap()
            .argument_with(
                "remove <item>",
                None,
                ChoiceSource::dynamic(move |partial: String, _| async move {
                    Ok(items
                        .iter()
                        .filter(|item| item.starts_with(&partial))
                        .map(|item| item.to_string())
                        .collect())
                }),
                ArgumentOptions::default(),
            )
            .unwrap()
            .build()
            .unwrap();

        let mut dispatcher = Dispatcher::new(platform, "/");
        dispatcher.register(todo).await.unwrap();

        let request = Invocation::new("todo", "42")
            .with_subcommand("remove")
            .with_focused("item")
            .with_option("item", Value::from("mi"));
        let suggestions = dispatcher.autocomplete(&request).await.unwrap();
        assert_eq!(suggestions, vec!["milk", "mint tea"]);

        // Unknown argument: no callback, no suggestions
        let request = Invocation::new("todo", "42").with_focused("other");
        assert!(dispatcher.autocomplete(&request).await.unwrap().is_empty());

        assert_eq!(received.lock().unwrap().len(), 2);

        let request = Invocation::new("todo", "42");
        assert!(dispatcher.autocomplete(&request).await.is_err());
    }
}
