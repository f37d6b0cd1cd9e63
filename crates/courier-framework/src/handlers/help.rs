//! `/help`

use courier_core::{SendOutcome, Session, Settings};

use super::Invocation;
use crate::error::CommandResult;
use crate::registry::CommandRegistry;

/// Builds the help text: a summary line, then one `trigger：description`
/// line per built-in command, then custom and plugin commands that declare
/// a description.
pub fn help_text(registry: &CommandRegistry, settings: &Settings) -> String {
    let strings = &settings.strings;
    let builtin = registry
        .commands()
        .iter()
        .map(|cmd| format!("{}：{}", cmd.trigger(), cmd.description(strings)));
    let custom = settings.custom_commands.iter().filter_map(|c| {
        c.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("{}：{}", c.trigger, d))
    });
    let plugins = settings.plugin_commands.iter().filter_map(|p| {
        p.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("{}：{}", p.trigger, d))
    });

    let lines: Vec<String> = builtin.chain(custom).chain(plugins).collect();
    format!("{}\n{}", strings.help_summary, lines.join("\n"))
}

pub(super) async fn help(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let text = help_text(inv.registry, inv.settings);
    Ok(inv.reply(session, &text).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{CustomCommand, PluginCommand};

    #[test]
    fn test_help_lists_everything_described() {
        let settings = Settings {
            custom_commands: vec![
                CustomCommand {
                    trigger: "/gpt4".into(),
                    command: "/setenv CHAT_MODEL=gpt-4".into(),
                    description: Some("Switch to GPT-4".into()),
                },
                CustomCommand {
                    trigger: "/quiet".into(),
                    command: "/new".into(),
                    description: None,
                },
            ],
            plugin_commands: vec![PluginCommand {
                trigger: "/dns".into(),
                template: "https://plugins.test/dns.json".into(),
                description: Some("DNS lookup".into()),
            }],
            ..Settings::default()
        };
        let registry = CommandRegistry::from_settings(&settings);

        let text = help_text(&registry, &settings);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], settings.strings.help_summary);
        assert_eq!(lines[1], format!("/help：{}", settings.strings.help_help));
        assert_eq!(lines.len(), 1 + registry.commands().len() + 2);
        assert_eq!(lines[lines.len() - 2], "/gpt4：Switch to GPT-4");
        assert_eq!(lines[lines.len() - 1], "/dns：DNS lookup");
        assert!(!text.contains("/quiet"));
    }

    #[test]
    fn test_help_mentions_echo_only_in_dev_mode() {
        let settings = Settings::default();
        let text = help_text(&CommandRegistry::from_settings(&settings), &settings);
        assert!(!text.contains("/echo"));

        let dev = Settings {
            dev_mode: true,
            ..Settings::default()
        };
        let text = help_text(&CommandRegistry::from_settings(&dev), &dev);
        assert!(text.contains("/echo："));
    }
}
