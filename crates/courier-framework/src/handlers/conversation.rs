//! `/new`, `/start` and `/redo`.

use tracing::{debug, info};

use courier_core::{HistoryItem, ReplyMarkup, SendOutcome, Session};

use super::Invocation;
use crate::command::Command;
use crate::error::{CommandError, CommandResult};

/// Drops the chat history and announces a fresh conversation.
pub(super) async fn new_session(
    inv: &Invocation<'_>,
    session: &mut Session,
) -> CommandResult<SendOutcome> {
    inv.services.store.delete(&session.share.history_key).await?;
    info!(key = %session.share.history_key, "Chat history cleared");

    let mut text = inv.settings.strings.new_chat_start.clone();
    if inv.command == Command::Start {
        text.push_str(&format!("({})", session.chat.chat_id));
    }

    session.chat.reply_markup = if inv.settings.show_reply_button && !session.share.chat_type.is_group() {
        Some(ReplyMarkup::quick_reply(&["/new", "/redo"]))
    } else {
        Some(ReplyMarkup::remove())
    };

    Ok(inv.reply(session, &text).await)
}

/// Resubmits the last user turn, or `subcommand` in its place.
pub(super) async fn redo(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let history = session.load_history(inv.services.store.as_ref()).await?;
    let (base, message) = regenerate(&history, inv.subcommand)?;
    debug!(
        kept = base.len(),
        resubmit = message.is_some(),
        "Regenerating last turn"
    );
    Ok(inv.services.chat_flow.chat(session, base, message).await?)
}

/// Computes the history and message `/redo` resubmits.
///
/// Entries are popped from a copy of `history` until the most recent user
/// entry has been removed. The message is `subcommand` when non-empty,
/// otherwise the removed user entry's content.
pub fn regenerate(
    history: &[HistoryItem],
    subcommand: &str,
) -> CommandResult<(Vec<HistoryItem>, Option<String>)> {
    if history.is_empty() {
        return Err(CommandError::HistoryNotFound);
    }

    let mut base = history.to_vec();
    let mut message = None;
    while let Some(item) = base.pop() {
        if item.is_user() {
            message = item.content;
            break;
        }
    }

    if !subcommand.is_empty() {
        message = Some(subcommand.to_string());
    }
    Ok((base, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::invoke;
    use crate::testing::{Harness, Sent, message};
    use courier_core::{ChatType, KvStore, Settings};

    fn history() -> Vec<HistoryItem> {
        vec![
            HistoryItem::user("a"),
            HistoryItem::assistant("b"),
            HistoryItem::user("c"),
        ]
    }

    #[test]
    fn test_regenerate_pops_through_last_user_entry() {
        let (base, message) = regenerate(&history(), "").unwrap();
        assert_eq!(base, vec![HistoryItem::user("a"), HistoryItem::assistant("b")]);
        assert_eq!(message.as_deref(), Some("c"));
    }

    #[test]
    fn test_regenerate_prefers_explicit_text() {
        let (base, message) = regenerate(&history(), "subtext").unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(message.as_deref(), Some("subtext"));

        let trailing = [HistoryItem::user("q"), HistoryItem::assistant("r")];
        let (base, message) = regenerate(&trailing, "").unwrap();
        assert!(base.is_empty());
        assert_eq!(message.as_deref(), Some("q"));
    }

    #[test]
    fn test_regenerate_without_user_entry() {
        let (base, message) = regenerate(&[HistoryItem::assistant("x")], "").unwrap();
        assert!(base.is_empty());
        assert_eq!(message, None);
    }

    #[test]
    fn test_regenerate_leaves_input_untouched() {
        let original = history();
        let _ = regenerate(&original, "").unwrap();
        assert_eq!(original, history());
    }

    #[test]
    fn test_regenerate_empty_history() {
        assert!(matches!(
            regenerate(&[], "x"),
            Err(CommandError::HistoryNotFound)
        ));
    }

    #[tokio::test]
    async fn test_redo_without_history_never_calls_chat() {
        let harness = Harness::new();
        let settings = Settings::default();
        let msg = message(ChatType::Private, "/redo");
        let mut session = crate::testing::session(ChatType::Private, &settings);

        let err = invoke(&harness, &settings, &msg, Command::Redo, "", &mut session)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "History not found");
        assert!(harness.chat_flow.calls().is_empty());
    }

    #[tokio::test]
    async fn test_redo_delegates_to_chat_flow() {
        let harness = Harness::new();
        let settings = Settings::default();
        let msg = message(ChatType::Private, "/redo");
        let mut session = crate::testing::session(ChatType::Private, &settings);
        harness
            .store
            .put(
                &session.share.history_key,
                &serde_json::to_string(&history()).unwrap(),
            )
            .await
            .unwrap();

        invoke(&harness, &settings, &msg, Command::Redo, "", &mut session)
            .await
            .unwrap();
        let calls = harness.chat_flow.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].history.len(), 2);
        assert_eq!(calls[0].message.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_new_clears_history_and_removes_keyboard() {
        let harness = Harness::new();
        let settings = Settings::default();
        let msg = message(ChatType::Group, "/new");
        let mut session = crate::testing::session(ChatType::Group, &settings);
        harness.store.put(&session.share.history_key, "[]").await.unwrap();

        invoke(&harness, &settings, &msg, Command::New, "", &mut session)
            .await
            .unwrap();
        // Running it twice is harmless.
        invoke(&harness, &settings, &msg, Command::New, "", &mut session)
            .await
            .unwrap();

        assert_eq!(harness.store.get(&session.share.history_key).await.unwrap(), None);
        assert_eq!(session.chat.reply_markup, Some(ReplyMarkup::remove()));
        assert_eq!(
            harness.sender.last_text().as_deref(),
            Some(settings.strings.new_chat_start.as_str())
        );
    }

    #[tokio::test]
    async fn test_start_shows_chat_id_and_keyboard() {
        let harness = Harness::new();
        let settings = Settings {
            show_reply_button: true,
            ..Settings::default()
        };
        let msg = message(ChatType::Private, "/start");
        let mut session = crate::testing::session(ChatType::Private, &settings);

        invoke(&harness, &settings, &msg, Command::Start, "", &mut session)
            .await
            .unwrap();

        let Some(Sent::Text { chat, text }) = harness.sender.sent().pop() else {
            panic!("expected a text reply");
        };
        assert_eq!(text, format!("{}({})", settings.strings.new_chat_start, chat.chat_id));
        assert_eq!(
            chat.reply_markup,
            Some(ReplyMarkup::quick_reply(&["/new", "/redo"]))
        );
    }
}
