//! `/system` and the dev-mode `/echo`.

use serde_json::{Map, Value, json};

use courier_core::{ParseMode, SendOutcome, Session};

use super::{Invocation, escape_html};
use crate::error::CommandResult;

/// Reports the resolved providers; in dev mode also dumps the session with
/// credentials masked.
pub(super) async fn system_info(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let providers = &inv.services.providers;
    let mut agent = Map::new();
    if let Some(chat) = providers.chat_provider(&session.config) {
        agent.insert("AI_PROVIDER".into(), json!(chat.name()));
        if let Some(model) = chat.model(&session.config) {
            agent.insert(chat.model_key().to_string(), json!(model));
        }
    }
    if let Some(image) = providers.image_provider(&session.config) {
        agent.insert("AI_IMAGE_PROVIDER".into(), json!(image.name()));
        if let Some(model) = image.model(&session.config) {
            agent.insert(image.model_key().to_string(), json!(model));
        }
    }

    let mut text = format!("AGENT: {}\n", serde_json::to_string_pretty(&Value::Object(agent))?);
    if inv.settings.dev_mode {
        let config = Value::Object(session.config.redacted().trim(inv.locked_keys()));
        text.push_str(&format!(
            "USER_CONFIG: {}\n",
            serde_json::to_string_pretty(&config)?
        ));
        text.push_str(&format!(
            "CHAT_CONTEXT: {}\n",
            serde_json::to_string_pretty(&session.chat)?
        ));
        text.push_str(&format!(
            "SHARE_CONTEXT: {}\n",
            serde_json::to_string_pretty(&session.share.redacted())?
        ));
        text = format!("<pre>\n{}</pre>", escape_html(&text));
    } else {
        text = escape_html(&text);
    }

    session.chat.parse_mode = Some(ParseMode::Html);
    Ok(inv.reply(session, &text).await)
}

/// Echoes the incoming message as JSON.
pub(super) async fn echo(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let dump = serde_json::to_string_pretty(&json!({ "message": inv.message }))?;
    session.chat.parse_mode = Some(ParseMode::Html);
    Ok(inv.reply(session, &format!("<pre>{}</pre>", escape_html(&dump))).await)
}
