//! Exact-match command aliases.

use std::collections::HashMap;

use courier_core::CustomCommand;

/// Maps an exact trigger text to the command text it stands for.
///
/// Resolution is a single lookup: the replacement is never resolved again,
/// so aliases cannot chain or loop.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from configured custom commands. Later duplicates of
    /// a trigger are ignored.
    pub fn from_commands(commands: &[CustomCommand]) -> Self {
        let mut entries = HashMap::with_capacity(commands.len());
        for c in commands {
            entries
                .entry(c.trigger.clone())
                .or_insert_with(|| c.command.clone());
        }
        Self { entries }
    }

    /// Adds an alias (builder pattern).
    pub fn with(mut self, trigger: impl Into<String>, command: impl Into<String>) -> Self {
        self.entries.insert(trigger.into(), command.into());
        self
    }

    /// Returns the replacement for `text`, or `text` itself.
    pub fn resolve<'a>(&'a self, text: &'a str) -> &'a str {
        self.entries.get(text).map(String::as_str).unwrap_or(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let table = AliasTable::new().with("/gpt4", "/setenv CHAT_MODEL=gpt-4");
        assert_eq!(table.resolve("/gpt4"), "/setenv CHAT_MODEL=gpt-4");
        assert_eq!(table.resolve("/gpt4 now"), "/gpt4 now");
        assert_eq!(table.resolve("hello"), "hello");
    }

    #[test]
    fn test_single_substitution() {
        let table = AliasTable::new().with("/a", "/b").with("/b", "/c");
        assert_eq!(table.resolve("/a"), "/b");
    }

    #[test]
    fn test_first_definition_wins() {
        let table = AliasTable::from_commands(&[
            CustomCommand {
                trigger: "/x".into(),
                command: "/new".into(),
                description: None,
            },
            CustomCommand {
                trigger: "/x".into(),
                command: "/redo".into(),
                description: None,
            },
        ]);
        assert_eq!(table.resolve("/x"), "/new");
        assert_eq!(table.len(), 1);
    }
}
