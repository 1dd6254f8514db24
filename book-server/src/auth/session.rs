use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_NICKNAME_KEY: &str = "nickname";
pub const SESSION_OAUTH_STATE_KEY: &str = "oauth_state";
pub const SESSION_CSRF_KEY: &str = "csrf_token";
pub const SESSION_FLASH_KEY: &str = "flash";

/// Transient message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flash {
    Alert(String),
    Error(String),
}

impl Flash {
    pub fn css_class(&self) -> &'static str {
        match self {
            Flash::Alert(_) => "flash-alert",
            Flash::Error(_) => "flash-error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Flash::Alert(m) | Flash::Error(m) => m,
        }
    }
}

/// Extract the authenticated user ID from the session, if present.
pub async fn get_user_id(session: &Session) -> Option<String> {
    session
        .get::<String>(SESSION_USER_ID_KEY)
        .await
        .ok()
        .flatten()
}

pub async fn get_nickname(session: &Session) -> Option<String> {
    session
        .get::<String>(SESSION_NICKNAME_KEY)
        .await
        .ok()
        .flatten()
}

/// Write user identity into the session after a successful sign-in.
/// The session id is rotated so a pre-login id cannot be reused.
pub async fn set_user(session: &Session, user_id: &str, nickname: &str) -> anyhow::Result<()> {
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_ID_KEY, user_id.to_string())
        .await?;
    session
        .insert(SESSION_NICKNAME_KEY, nickname.to_string())
        .await?;
    Ok(())
}

/// Clear the session on sign-out.
pub async fn clear(session: &Session) -> anyhow::Result<()> {
    session.flush().await?;
    Ok(())
}

pub async fn push_flash(session: &Session, flash: Flash) -> anyhow::Result<()> {
    let mut pending = session
        .get::<Vec<Flash>>(SESSION_FLASH_KEY)
        .await?
        .unwrap_or_default();
    pending.push(flash);
    session.insert(SESSION_FLASH_KEY, pending).await?;
    Ok(())
}

/// Remove and return pending flash messages.
pub async fn take_flash(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(SESSION_FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// The session's anti-forgery token, minted on first use.
pub async fn csrf_token(session: &Session) -> anyhow::Result<String> {
    if let Some(token) = session.get::<String>(SESSION_CSRF_KEY).await? {
        return Ok(token);
    }
    let token = super::random_token();
    session.insert(SESSION_CSRF_KEY, token.clone()).await?;
    Ok(token)
}

pub async fn stored_csrf_token(session: &Session) -> Option<String> {
    session
        .get::<String>(SESSION_CSRF_KEY)
        .await
        .ok()
        .flatten()
}
