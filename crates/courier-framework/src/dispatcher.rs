//! Command dispatcher for the Courier engine.
//!
//! The [`Dispatcher`] decides whether an incoming message is a command and,
//! if so, runs it and sends exactly one reply. Routing happens in a fixed
//! order:
//!
//! 1. The command text is the message text (or caption), trimmed
//! 2. An exact alias match replaces the text, once
//! 3. Plugin commands are scanned in configuration order; the first match
//!    runs its template and ends dispatch
//! 4. Built-in commands are scanned; a match passes the authorization gate
//!    and then runs its handler
//! 5. Anything else is not a command and yields `None`
//!
//! Errors never escape [`Dispatcher::dispatch`]: they are reported to the
//! chat as `ERROR: <message>`.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(settings, services);
//! let mut session = dispatcher.load_session(&message, &bot).await?;
//! if dispatcher.dispatch(&message, &mut session).await.is_none() {
//!     // hand the message to the chat flow
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, debug, debug_span, error};

use courier_core::{
    BotIdentity, ChatFlow, ChatMessage, HttpFetcher, KvStore, MenuCommand, MenuRegistrar,
    MessageSender, ParseMode, PluginCommand, ProviderResolver, RoleResolver, SendOutcome, Session,
    Settings, StoreResult, TransportResult,
};

use crate::alias::AliasTable;
use crate::auth::authorize;
use crate::command::match_trigger;
use crate::error::{CommandError, PluginResult};
use crate::handlers::{self, Invocation};
use crate::plugin::{PluginOutput, execute, resolve_template};
use crate::registry::CommandRegistry;

/// The collaborators a dispatcher works through.
#[derive(Clone)]
pub struct Services {
    pub sender: Arc<dyn MessageSender>,
    pub store: Arc<dyn KvStore>,
    pub roles: Arc<dyn RoleResolver>,
    pub providers: Arc<dyn ProviderResolver>,
    pub fetcher: Arc<dyn HttpFetcher>,
    pub chat_flow: Arc<dyn ChatFlow>,
}

/// Routes messages to plugin and built-in commands.
///
/// Built once from [`Settings`]; cheap to share behind an `Arc` and safe to
/// use from many tasks at once.
#[derive(Clone)]
pub struct Dispatcher {
    settings: Arc<Settings>,
    services: Services,
    registry: CommandRegistry,
    aliases: AliasTable,
}

impl Dispatcher {
    pub fn new(settings: Arc<Settings>, services: Services) -> Self {
        let registry = CommandRegistry::from_settings(&settings);
        let aliases = AliasTable::from_commands(&settings.custom_commands);
        debug!(
            commands = registry.commands().len(),
            aliases = aliases.len(),
            plugins = settings.plugin_commands.len(),
            "Dispatcher ready"
        );
        Self {
            settings,
            services,
            registry,
            aliases,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Lists every built-in command with its description.
    pub fn commands_document(&self) -> Vec<MenuCommand> {
        self.registry.document(&self.settings.strings)
    }

    /// Registers the command menu with the platform.
    pub async fn bind_commands(
        &self,
        registrar: &dyn MenuRegistrar,
    ) -> TransportResult<BTreeMap<String, Value>> {
        self.registry
            .bind_commands(
                registrar,
                &self.settings.hide_command_buttons,
                &self.settings.strings,
            )
            .await
    }

    /// Builds the session for `message`, applying its persisted config.
    pub async fn load_session(&self, message: &ChatMessage, bot: &BotIdentity) -> StoreResult<Session> {
        Session::load(message, bot, &self.settings, self.services.store.as_ref()).await
    }

    /// Handles `message` if it is a command.
    ///
    /// Returns the outcome of the reply that was sent, or `None` when the
    /// message is not a command and nothing was sent.
    pub async fn dispatch(&self, message: &ChatMessage, session: &mut Session) -> Option<SendOutcome> {
        let span = debug_span!(
            "dispatch",
            chat_id = message.chat.id,
            message_id = message.message_id
        );
        self.route(message, session).instrument(span).await
    }

    async fn route(&self, message: &ChatMessage, session: &mut Session) -> Option<SendOutcome> {
        let text = self.aliases.resolve(message.command_text());

        for plugin in &self.settings.plugin_commands {
            if let Some(subcommand) = match_trigger(text, &plugin.trigger) {
                debug!(trigger = %plugin.trigger, "Routing to plugin");
                return Some(self.run_plugin(plugin, subcommand, session).await);
            }
        }

        let (command, subcommand) = self.registry.find(text)?;
        debug!(%command, "Routing to command");

        if let Err(e) = authorize(
            command.auth(),
            self.settings.share_mode,
            &session.share,
            self.services.roles.as_ref(),
        )
        .await
        {
            return Some(self.report(session, &e.into()).await);
        }

        let inv = Invocation {
            message,
            command,
            subcommand,
            settings: &self.settings,
            services: &self.services,
            registry: &self.registry,
        };
        match handlers::run(&inv, session).await {
            Ok(outcome) => Some(outcome),
            Err(e) => Some(self.report(session, &e).await),
        }
    }

    async fn run_plugin(&self, plugin: &PluginCommand, subcommand: &str, session: &mut Session) -> SendOutcome {
        let sender = &self.services.sender;
        let (mode, content) = match self.execute_plugin(plugin, subcommand).await {
            Ok(PluginOutput::Image(photo)) => return sender.send_photo(&session.chat, photo).await,
            Ok(PluginOutput::Html(content)) => (Some(ParseMode::Html), content),
            Ok(PluginOutput::Markdown(content)) => (Some(ParseMode::Markdown), content),
            Ok(PluginOutput::Text(content)) => (None, content),
            Err(e) => {
                error!(trigger = %plugin.trigger, error = %e, "Plugin failed");
                let mut text = format!("ERROR: {e}");
                if let Some(help) = plugin.description.as_deref() {
                    text.push('\n');
                    text.push_str(help);
                }
                return sender.send_text(&session.chat, &text).await;
            }
        };
        session.chat.parse_mode = mode;
        sender.send_text(&session.chat, &content).await
    }

    async fn execute_plugin(&self, plugin: &PluginCommand, subcommand: &str) -> PluginResult<PluginOutput> {
        let fetcher = self.services.fetcher.as_ref();
        let template = resolve_template(&plugin.template, fetcher).await?;
        execute(&template, subcommand, &self.settings.plugins_env, fetcher).await
    }

    async fn report(&self, session: &Session, err: &CommandError) -> SendOutcome {
        error!(chat_id = session.share.chat_id, error = %err, "Command failed");
        self.services
            .sender
            .send_text(&session.chat, &format!("ERROR: {err}"))
            .await
    }
}
