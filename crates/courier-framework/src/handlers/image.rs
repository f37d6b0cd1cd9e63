//! `/img`

use std::sync::Arc;

use tracing::{debug, warn};

use courier_core::{ChatAction, SendOutcome, Session};

use super::Invocation;
use crate::error::{CommandError, CommandResult};

pub(super) async fn generate(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    if inv.subcommand.is_empty() {
        return Ok(inv.reply(session, &inv.settings.strings.help_img).await);
    }

    let provider = inv
        .services
        .providers
        .image_provider(&session.config)
        .ok_or(CommandError::ImageProviderNotFound)?;
    debug!(provider = provider.name(), "Generating image");

    // The presence indicator is not awaited; its outcome is logged and dropped.
    let sender = Arc::clone(&inv.services.sender);
    let chat = session.chat.clone();
    tokio::spawn(async move {
        let outcome = sender.send_chat_action(&chat, ChatAction::UploadPhoto).await;
        if !outcome.ok {
            warn!(status = outcome.status, body = %outcome.body, "Presence indicator failed");
        }
    });

    let photo = provider.request(inv.subcommand, &session.config).await?;
    let outcome = inv.services.sender.send_photo(&session.chat, photo).await;
    if !outcome.ok {
        return Err(CommandError::other(format!(
            "{} {}",
            outcome.status_text, outcome.body
        )));
    }
    Ok(outcome)
}
