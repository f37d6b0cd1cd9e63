//! Built-in commands and trigger matching.
//!
//! Every built-in command is a variant of [`Command`]. The variant carries
//! its static metadata (trigger, menu scopes, authorization policy); the
//! dispatcher maps each variant to its handler with an exhaustive `match`.
//!
//! # Trigger matching
//!
//! A trigger matches the command text when the text equals the trigger, or
//! starts with the trigger followed by a space. The remainder, trimmed, is
//! the subcommand:
//!
//! ```rust,ignore
//! assert_eq!(match_trigger("/img  a cat ", "/img"), Some("a cat"));
//! assert_eq!(match_trigger("/img", "/img"), Some(""));
//! assert_eq!(match_trigger("/imgx", "/img"), None);
//! ```

use courier_core::{CommandScope, Strings};

use crate::auth::AuthPolicy;

const PRIVATE_AND_ADMINS: &[CommandScope] = &[
    CommandScope::AllPrivateChats,
    CommandScope::AllChatAdministrators,
];
const EVERYWHERE: &[CommandScope] = &[
    CommandScope::AllPrivateChats,
    CommandScope::AllGroupChats,
    CommandScope::AllChatAdministrators,
];

/// A built-in command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Help,
    New,
    Start,
    Img,
    Version,
    SetEnv,
    SetEnvs,
    DelEnv,
    ClearEnv,
    System,
    Redo,
    /// Debug-only; registered in dev mode.
    Echo,
}

impl Command {
    /// All commands in registration order.
    pub const ALL: [Command; 12] = [
        Self::Help,
        Self::New,
        Self::Start,
        Self::Img,
        Self::Version,
        Self::SetEnv,
        Self::SetEnvs,
        Self::DelEnv,
        Self::ClearEnv,
        Self::System,
        Self::Redo,
        Self::Echo,
    ];

    /// Commands offered in the platform menu, in menu order.
    pub const MENU_ORDER: [Command; 8] = [
        Self::New,
        Self::Redo,
        Self::Img,
        Self::SetEnv,
        Self::DelEnv,
        Self::Version,
        Self::System,
        Self::Help,
    ];

    pub fn trigger(self) -> &'static str {
        match self {
            Self::Help => "/help",
            Self::New => "/new",
            Self::Start => "/start",
            Self::Img => "/img",
            Self::Version => "/version",
            Self::SetEnv => "/setenv",
            Self::SetEnvs => "/setenvs",
            Self::DelEnv => "/delenv",
            Self::ClearEnv => "/clearenv",
            Self::System => "/system",
            Self::Redo => "/redo",
            Self::Echo => "/echo",
        }
    }

    /// Menu scopes this command is advertised in.
    pub fn scopes(self) -> &'static [CommandScope] {
        match self {
            Self::New | Self::Redo => EVERYWHERE,
            Self::Help | Self::Img | Self::Version | Self::System | Self::Echo => {
                PRIVATE_AND_ADMINS
            }
            Self::Start | Self::SetEnv | Self::SetEnvs | Self::DelEnv | Self::ClearEnv => &[],
        }
    }

    pub fn auth(self) -> Option<AuthPolicy> {
        match self {
            Self::SetEnv | Self::SetEnvs | Self::DelEnv | Self::ClearEnv => {
                Some(AuthPolicy::ShareModeGroup)
            }
            Self::System | Self::Echo => Some(AuthPolicy::Default),
            Self::Help | Self::New | Self::Start | Self::Img | Self::Version | Self::Redo => None,
        }
    }

    /// Whether the command only exists in dev mode.
    pub fn dev_only(self) -> bool {
        matches!(self, Self::Echo)
    }

    /// Help text for the command.
    pub fn description(self, strings: &Strings) -> &str {
        match self {
            Self::Help => &strings.help_help,
            Self::New => &strings.help_new,
            Self::Start => &strings.help_start,
            Self::Img => &strings.help_img,
            Self::Version => &strings.help_version,
            Self::SetEnv => &strings.help_setenv,
            Self::SetEnvs => &strings.help_setenvs,
            Self::DelEnv => &strings.help_delenv,
            Self::ClearEnv => &strings.help_clearenv,
            Self::System => &strings.help_system,
            Self::Redo => &strings.help_redo,
            Self::Echo => &strings.help_echo,
        }
    }

    /// Looks a command up by its trigger (e.g. `"/new"`).
    pub fn from_trigger(trigger: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.trigger() == trigger)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.trigger())
    }
}

/// Matches `text` against `trigger` and returns the trimmed subcommand.
pub fn match_trigger<'a>(text: &'a str, trigger: &str) -> Option<&'a str> {
    if text == trigger {
        return Some("");
    }
    text.strip_prefix(trigger)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}
