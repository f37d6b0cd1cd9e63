//! Command registry and platform menu binding.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use courier_core::{
    CommandScope, MenuCommand, MenuRegistrar, MenuRequest, ScopeRef, Settings, Strings,
    TransportResult,
};

use crate::command::{Command, match_trigger};

/// The set of built-in commands available in this process.
///
/// Assembled once at start-up; dev-only commands are included only when
/// dev mode is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Registers every command, leaving out dev-only ones unless `dev_mode`.
    pub fn new(dev_mode: bool) -> Self {
        let commands = Command::ALL
            .into_iter()
            .filter(|c| dev_mode || !c.dev_only())
            .collect();
        Self { commands }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.dev_mode)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn contains(&self, command: Command) -> bool {
        self.commands.contains(&command)
    }

    /// Finds the first command whose trigger matches `text`, returning it
    /// with the subcommand.
    pub fn find<'a>(&self, text: &'a str) -> Option<(Command, &'a str)> {
        self.commands
            .iter()
            .find_map(|&cmd| match_trigger(text, cmd.trigger()).map(|sub| (cmd, sub)))
    }

    /// Lists every registered command with its description.
    pub fn document(&self, strings: &Strings) -> Vec<MenuCommand> {
        self.commands
            .iter()
            .map(|cmd| MenuCommand {
                command: cmd.trigger().to_string(),
                description: cmd.description(strings).to_string(),
            })
            .collect()
    }

    /// Builds one menu request per scope.
    ///
    /// Every scope is present, so scopes with no commands are cleared on the
    /// platform. Commands in `hidden` are skipped.
    pub fn menu_requests(&self, hidden: &[String], strings: &Strings) -> Vec<MenuRequest> {
        let mut by_scope: BTreeMap<CommandScope, Vec<MenuCommand>> =
            CommandScope::ALL.into_iter().map(|s| (s, Vec::new())).collect();

        for cmd in Command::MENU_ORDER {
            if !self.contains(cmd) || hidden.iter().any(|h| h == cmd.trigger()) {
                continue;
            }
            for scope in cmd.scopes() {
                by_scope.entry(*scope).or_default().push(MenuCommand {
                    command: cmd.trigger().to_string(),
                    description: cmd.description(strings).to_string(),
                });
            }
        }

        CommandScope::ALL
            .into_iter()
            .map(|scope| MenuRequest {
                commands: by_scope.remove(&scope).unwrap_or_default(),
                scope: ScopeRef { kind: scope },
            })
            .collect()
    }

    /// Registers the menu for every scope, one call per scope, and returns
    /// the platform's acknowledgements keyed by scope name.
    pub async fn bind_commands(
        &self,
        registrar: &dyn MenuRegistrar,
        hidden: &[String],
        strings: &Strings,
    ) -> TransportResult<BTreeMap<String, Value>> {
        let mut acks = BTreeMap::new();
        for request in self.menu_requests(hidden, strings) {
            let scope = request.scope.kind.as_str();
            debug!(scope, commands = request.commands.len(), "Binding command menu");
            let ack = registrar.set_my_commands(&request).await?;
            acks.insert(scope.to_string(), ack);
        }
        info!(scopes = acks.len(), "Command menu bound");
        Ok(acks)
    }
}
