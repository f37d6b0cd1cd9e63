//! Built-in command handlers.
//!
//! Each handler takes the [`Invocation`] and the request's [`Session`] and
//! produces the outcome of the single reply it sends. Validation problems
//! are answered directly by the handler; everything else is returned as a
//! [`CommandError`](crate::error::CommandError) for the dispatcher to report.

mod config;
mod conversation;
mod help;
mod image;
mod system;
mod version;

pub use conversation::regenerate;
pub use help::help_text;
pub use version::format_time;

use courier_core::{ChatMessage, SendOutcome, Session, Settings};

use crate::command::Command;
use crate::dispatcher::Services;
use crate::error::CommandResult;
use crate::registry::CommandRegistry;

/// Everything a handler knows about the command being run.
pub struct Invocation<'a> {
    pub message: &'a ChatMessage,
    pub command: Command,
    /// Text after the trigger, trimmed.
    pub subcommand: &'a str,
    pub settings: &'a Settings,
    pub services: &'a Services,
    pub registry: &'a CommandRegistry,
}

impl Invocation<'_> {
    /// Sends `text` to the session's chat.
    pub async fn reply(&self, session: &Session, text: &str) -> SendOutcome {
        self.services.sender.send_text(&session.chat, text).await
    }

    fn locked_keys(&self) -> &[String] {
        &self.settings.lock_user_config_keys
    }
}

/// Runs the handler for `inv.command`.
pub async fn run(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    match inv.command {
        Command::Help => help::help(inv, session).await,
        Command::New | Command::Start => conversation::new_session(inv, session).await,
        Command::Redo => conversation::redo(inv, session).await,
        Command::Img => image::generate(inv, session).await,
        Command::Version => version::check_update(inv, session).await,
        Command::SetEnv => config::set_env(inv, session).await,
        Command::SetEnvs => config::set_envs(inv, session).await,
        Command::DelEnv => config::del_env(inv, session).await,
        Command::ClearEnv => config::clear_env(inv, session).await,
        Command::System => system::system_info(inv, session).await,
        Command::Echo => system::echo(inv, session).await,
    }
}

/// Escapes text for the HTML parse mode.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
