//! Process assembly.
//!
//! [`CourierRuntime`] turns a loaded [`CourierConfig`] into the pieces a
//! host process needs: shared [`Settings`], an HTTP client, the Bot API
//! client for menu registration and, given the host's own collaborators, a
//! ready [`Dispatcher`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use courier_core::{
    BotIdentity, ChatFlow, KvStore, MenuCommand, MessageSender, ProviderResolver, RoleResolver,
    Settings,
};
use courier_framework::{CommandRegistry, Dispatcher, Services};
use courier_transport::{HttpClient, TelegramBotApi};

use crate::config::{ConfigError, ConfigLoader, CourierConfig, validate_config};
use crate::error::RuntimeResult;

/// Collaborators supplied by the host process.
///
/// HTTP fetching is provided by the runtime itself.
#[derive(Clone)]
pub struct Collaborators {
    pub sender: Arc<dyn MessageSender>,
    pub store: Arc<dyn KvStore>,
    pub roles: Arc<dyn RoleResolver>,
    pub providers: Arc<dyn ProviderResolver>,
    pub chat_flow: Arc<dyn ChatFlow>,
}

pub struct CourierRuntime {
    config: CourierConfig,
    settings: Arc<Settings>,
    http: Arc<HttpClient>,
    bot_api: TelegramBotApi,
}

impl CourierRuntime {
    /// Validates `config` and builds the runtime.
    pub fn new(config: CourierConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let http = HttpClient::with_timeout(Duration::from_secs(config.telegram.timeout_secs))?;
        let bot_api = TelegramBotApi::new(
            config.telegram.api_domain.clone(),
            config.telegram.token.clone(),
            http.inner().clone(),
        );
        let settings = Arc::new(config.bot.clone());

        info!(
            dev_mode = settings.dev_mode,
            share_mode = settings.share_mode,
            plugins = settings.plugin_commands.len(),
            aliases = settings.custom_commands.len(),
            "Runtime ready"
        );

        Ok(Self {
            config,
            settings,
            http: Arc::new(http),
            bot_api,
        })
    }

    /// Loads configuration with `loader` and builds the runtime.
    pub fn load(loader: ConfigLoader) -> RuntimeResult<Self> {
        Self::new(loader.load()?)
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    pub fn http_client(&self) -> Arc<HttpClient> {
        Arc::clone(&self.http)
    }

    pub fn bot_api(&self) -> &TelegramBotApi {
        &self.bot_api
    }

    /// Identity of the configured bot.
    pub fn bot_identity(&self) -> BotIdentity {
        BotIdentity::from_token(self.config.telegram.token.clone())
    }

    pub fn registry(&self) -> CommandRegistry {
        CommandRegistry::from_settings(&self.settings)
    }

    /// The documented built-in command list.
    pub fn commands_document(&self) -> Vec<MenuCommand> {
        self.registry().document(&self.settings.strings)
    }

    /// Builds a dispatcher over the host's collaborators.
    pub fn dispatcher(&self, collaborators: Collaborators) -> Dispatcher {
        let services = Services {
            sender: collaborators.sender,
            store: collaborators.store,
            roles: collaborators.roles,
            providers: collaborators.providers,
            fetcher: self.http.clone(),
            chat_flow: collaborators.chat_flow,
        };
        Dispatcher::new(self.settings(), services)
    }

    /// Registers the command menu for every scope, keyed by scope name.
    pub async fn bind_commands(&self) -> RuntimeResult<BTreeMap<String, Value>> {
        if self.config.telegram.token.is_empty() {
            return Err(ConfigError::missing_field("telegram.token").into());
        }
        let acks = self
            .registry()
            .bind_commands(
                &self.bot_api,
                &self.settings.hide_command_buttons,
                &self.settings.strings,
            )
            .await?;
        info!(scopes = acks.len(), "Command menus bound");
        Ok(acks)
    }
}
