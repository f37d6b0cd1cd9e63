//! Authorization gate for commands that change shared state.
//!
//! A command may declare an [`AuthPolicy`]. The policy maps the chat type to
//! the set of roles allowed to run the command, or to nothing when anyone
//! may run it there. Role lookups only happen when a policy actually
//! restricts the chat.

use tracing::{debug, warn};

use courier_core::{ChatRole, ChatType, RoleResolver, ShareContext};

use crate::error::AuthError;

const PRIVILEGED: &[ChatRole] = &[ChatRole::Administrator, ChatRole::Creator];

/// Declared authorization requirement of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Group chats require an administrator or the creator.
    Default,
    /// Like [`AuthPolicy::Default`], but only while share mode is on.
    ShareModeGroup,
}

impl AuthPolicy {
    /// Returns the permitted roles for `chat_type`, or `None` when the chat
    /// is unrestricted.
    pub fn required_roles(self, chat_type: ChatType, share_mode: bool) -> Option<&'static [ChatRole]> {
        if !chat_type.is_group() {
            return None;
        }
        match self {
            Self::Default => Some(PRIVILEGED),
            Self::ShareModeGroup if share_mode => Some(PRIVILEGED),
            Self::ShareModeGroup => None,
        }
    }
}

/// Decides whether the sender described by `share` may run a command with
/// the given policy.
pub async fn authorize(
    policy: Option<AuthPolicy>,
    share_mode: bool,
    share: &ShareContext,
    roles: &dyn RoleResolver,
) -> Result<(), AuthError> {
    let Some(policy) = policy else {
        return Ok(());
    };
    let Some(required) = policy.required_roles(share.chat_type, share_mode) else {
        return Ok(());
    };

    let Some(role) = roles.resolve_role(share).await else {
        warn!(chat_id = share.chat_id, speaker = ?share.speaker_id, "Chat role unavailable");
        return Err(AuthError::RoleUnavailable);
    };

    if required.contains(&role) {
        debug!(chat_id = share.chat_id, %role, "Authorized");
        Ok(())
    } else {
        warn!(
            chat_id = share.chat_id,
            speaker = ?share.speaker_id,
            %role,
            "Permission denied"
        );
        Err(AuthError::PermissionDenied {
            required: required.to_vec(),
        })
    }
}
