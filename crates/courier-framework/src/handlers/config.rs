//! `/setenv`, `/setenvs`, `/delenv` and `/clearenv`.
//!
//! Key validation failures (locked, unknown, uncoercible) are answered with
//! the validation message itself and change nothing. Successful changes are
//! persisted immediately under the chat's config key.

use serde_json::Value;
use tracing::info;

use courier_core::{ConfigKeyError, SendOutcome, Session};

use super::Invocation;
use crate::error::{CommandError, CommandResult};

const UPDATED: &str = "Update user config success";
const DELETED: &str = "Delete user config success";
const CLEARED: &str = "Clear user config success";

async fn rejected(inv: &Invocation<'_>, session: &Session, err: ConfigKeyError) -> SendOutcome {
    info!(chat_id = session.share.chat_id, reason = %err, "User config change rejected");
    inv.reply(session, &err.to_string()).await
}

/// `/setenv KEY=VALUE`
pub(super) async fn set_env(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let Some((key, value)) = inv.subcommand.split_once('=') else {
        return Ok(inv.reply(session, &inv.settings.strings.help_setenv).await);
    };

    if let Err(e) = session
        .config
        .set(key, Value::String(value.to_string()), inv.locked_keys())
    {
        return Ok(rejected(inv, session, e).await);
    }
    session
        .persist_config(inv.services.store.as_ref(), inv.locked_keys())
        .await?;
    info!(chat_id = session.share.chat_id, key, "User config updated");

    Ok(inv.reply(session, UPDATED).await)
}

/// `/setenvs {"KEY": "VALUE", ...}`
///
/// All keys are applied to a copy; the session only sees the result when
/// every key was accepted.
pub(super) async fn set_envs(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let Value::Object(values) = serde_json::from_str::<Value>(inv.subcommand)? else {
        return Err(CommandError::other("Expected a JSON object of KEY: VALUE pairs"));
    };

    let mut staged = session.config.clone();
    for (key, value) in values {
        if let Err(e) = staged.set(&key, value, inv.locked_keys()) {
            return Ok(rejected(inv, session, e).await);
        }
    }
    session.config = staged;
    session
        .persist_config(inv.services.store.as_ref(), inv.locked_keys())
        .await?;
    info!(
        chat_id = session.share.chat_id,
        defined = ?session.config.defined_keys(),
        "User config updated"
    );

    Ok(inv.reply(session, UPDATED).await)
}

/// `/delenv KEY`
pub(super) async fn del_env(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    if let Err(e) = session.config.unset(inv.subcommand, inv.locked_keys()) {
        return Ok(rejected(inv, session, e).await);
    }
    session
        .persist_config(inv.services.store.as_ref(), inv.locked_keys())
        .await?;
    info!(chat_id = session.share.chat_id, key = inv.subcommand, "User config deleted");

    Ok(inv.reply(session, DELETED).await)
}

/// `/clearenv`
pub(super) async fn clear_env(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    inv.services
        .store
        .put(&session.share.config_store_key, "{}")
        .await?;
    session.config = session.config.reset();
    info!(chat_id = session.share.chat_id, "User config cleared");

    Ok(inv.reply(session, CLEARED).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::handlers::test_support::invoke;
    use crate::testing::{Harness, message, session};
    use courier_core::user_config::keys;
    use courier_core::{ChatType, KvStore, Settings};
    use serde_json::json;

    async fn run(
        harness: &Harness,
        settings: &Settings,
        session: &mut Session,
        command: Command,
        sub: &str,
    ) -> CommandResult<SendOutcome> {
        let msg = message(ChatType::Private, sub);
        invoke(harness, settings, &msg, command, sub, session).await
    }

    async fn persisted(harness: &Harness, session: &Session) -> Option<Value> {
        harness
            .store
            .get(&session.share.config_store_key)
            .await
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test]
    async fn test_setenv_updates_and_persists() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(&harness, &settings, &mut session, Command::SetEnv, "CHAT_MODEL=gpt-4o")
            .await
            .unwrap();

        assert_eq!(session.config.get_str(keys::OPENAI_CHAT_MODEL), Some("gpt-4o"));
        assert_eq!(
            persisted(&harness, &session).await,
            Some(json!({"DEFINE_KEYS": ["OPENAI_CHAT_MODEL"], "OPENAI_CHAT_MODEL": "gpt-4o"}))
        );
        assert_eq!(harness.sender.last_text().as_deref(), Some(UPDATED));
    }

    #[tokio::test]
    async fn test_setenv_without_equals_shows_usage() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(&harness, &settings, &mut session, Command::SetEnv, "OPENAI_CHAT_MODEL")
            .await
            .unwrap();
        assert_eq!(
            harness.sender.last_text(),
            Some(settings.strings.help_setenv.clone())
        );
        assert_eq!(persisted(&harness, &session).await, None);
    }

    #[tokio::test]
    async fn test_setenv_rejects_every_locked_key() {
        let settings = Settings::default();
        for key in &settings.lock_user_config_keys {
            let harness = Harness::new();
            let mut session = session(ChatType::Private, &settings);
            let before = session.config.clone();

            run(
                &harness,
                &settings,
                &mut session,
                Command::SetEnv,
                &format!("{key}=https://evil.test"),
            )
            .await
            .unwrap();

            assert_eq!(session.config, before);
            assert_eq!(harness.sender.last_text(), Some(format!("Key {key} is locked")));
            assert_eq!(persisted(&harness, &session).await, None);
        }
    }

    #[tokio::test]
    async fn test_setenv_unknown_key() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(&harness, &settings, &mut session, Command::SetEnv, "NOPE=1")
            .await
            .unwrap();
        assert!(session.config.defined_keys().is_empty());
        assert_eq!(harness.sender.last_text().as_deref(), Some("Key NOPE not found"));
    }

    #[tokio::test]
    async fn test_setenv_key_is_taken_verbatim() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(&harness, &settings, &mut session, Command::SetEnv, "CHAT_MODEL =gpt-4o")
            .await
            .unwrap();
        assert!(session.config.defined_keys().is_empty());
        assert_eq!(
            harness.sender.last_text().as_deref(),
            Some("Key CHAT_MODEL  not found")
        );

        run(&harness, &settings, &mut session, Command::SetEnv, "CHAT_MODEL= gpt-4o")
            .await
            .unwrap();
        assert_eq!(session.config.get_str(keys::OPENAI_CHAT_MODEL), Some(" gpt-4o"));
    }

    #[tokio::test]
    async fn test_setenvs_batch() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(
            &harness,
            &settings,
            &mut session,
            Command::SetEnvs,
            r#"{"OPENAI_CHAT_MODEL": "gpt-4o", "SYSTEM_INIT_MESSAGE": "be brief"}"#,
        )
        .await
        .unwrap();

        let stored = persisted(&harness, &session).await.unwrap();
        assert_eq!(stored["OPENAI_CHAT_MODEL"], "gpt-4o");
        assert_eq!(stored["SYSTEM_INIT_MESSAGE"], "be brief");
        assert_eq!(session.config.defined_keys().len(), 2);
    }

    #[tokio::test]
    async fn test_setenvs_locked_key_discards_whole_batch() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);
        let before = session.config.clone();

        // The locked key is the second of three.
        run(
            &harness,
            &settings,
            &mut session,
            Command::SetEnvs,
            r#"{"AI_PROVIDER": "openai", "OPENAI_API_BASE": "https://evil.test", "SYSTEM_INIT_MESSAGE": "hi"}"#,
        )
        .await
        .unwrap();

        assert_eq!(
            harness.sender.last_text().as_deref(),
            Some("Key OPENAI_API_BASE is locked")
        );
        assert_eq!(session.config, before);
        assert_eq!(persisted(&harness, &session).await, None);
    }

    #[tokio::test]
    async fn test_setenvs_rejects_malformed_json() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        let err = run(&harness, &settings, &mut session, Command::SetEnvs, "not json")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Other(_)));

        let err = run(&harness, &settings, &mut session, Command::SetEnvs, "[1, 2]")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Other(_)));
    }

    #[tokio::test]
    async fn test_delenv_removes_defined_key() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);
        run(&harness, &settings, &mut session, Command::SetEnv, "OPENAI_CHAT_MODEL=x")
            .await
            .unwrap();

        run(&harness, &settings, &mut session, Command::DelEnv, "OPENAI_CHAT_MODEL")
            .await
            .unwrap();

        assert_eq!(session.config.get(keys::OPENAI_CHAT_MODEL), Some(&Value::Null));
        assert_eq!(
            persisted(&harness, &session).await,
            Some(json!({"DEFINE_KEYS": []}))
        );
        assert_eq!(harness.sender.last_text().as_deref(), Some(DELETED));
    }

    #[tokio::test]
    async fn test_delenv_locked_key() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);

        run(&harness, &settings, &mut session, Command::DelEnv, "OPENAI_API_BASE")
            .await
            .unwrap();
        assert_eq!(
            harness.sender.last_text().as_deref(),
            Some("Key OPENAI_API_BASE is locked")
        );
        assert_eq!(persisted(&harness, &session).await, None);
    }

    #[tokio::test]
    async fn test_clearenv_always_persists_empty_object() {
        let harness = Harness::new();
        let settings = Settings::default();
        let mut session = session(ChatType::Private, &settings);
        run(&harness, &settings, &mut session, Command::SetEnv, "OPENAI_CHAT_MODEL=x")
            .await
            .unwrap();

        run(&harness, &settings, &mut session, Command::ClearEnv, "")
            .await
            .unwrap();

        assert_eq!(
            harness
                .store
                .get(&session.share.config_store_key)
                .await
                .unwrap()
                .as_deref(),
            Some("{}")
        );
        assert!(session.config.defined_keys().is_empty());
        assert_eq!(harness.sender.last_text().as_deref(), Some(CLEARED));
    }
}
