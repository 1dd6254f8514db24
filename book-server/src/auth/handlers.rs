use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use shared_types::MeResponse;
use tower_sessions::Session;
use tracing::{error, info, warn};

use crate::auth::session::{self as sess, Flash};
use crate::auth::{random_token, tokens_match};
use crate::models::{audit, users};
use crate::AppState;

pub const SIGN_IN_FAILED_MESSAGE: &str =
    "There was a problem signing you in. Please register or try signing in later.";

// ── OAuth sign-in ─────────────────────────────────────────────────────────────

/// GET /auth/github
///
/// Stores a fresh `state` in the session and sends the browser to the
/// provider's authorize page.
pub async fn oauth_start(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let oauth_state = random_token();
    if let Err(e) = session
        .insert(sess::SESSION_OAUTH_STATE_KEY, oauth_state.clone())
        .await
    {
        error!("session insert oauth_state: {e}");
        return sign_in_failed(&state, &session, "session unavailable").await;
    }

    match state.oauth.authorize_url(&oauth_state) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            error!(provider = state.oauth.name(), "authorize url: {e}");
            sign_in_failed(&state, &session, "provider not configured").await
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/github/callback
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    let expected_state = session
        .remove::<String>(sess::SESSION_OAUTH_STATE_KEY)
        .await
        .ok()
        .flatten();

    if let Some(err) = &query.error {
        warn!(provider = state.oauth.name(), error = %err, "provider refused sign-in");
        return sign_in_failed(&state, &session, err).await;
    }

    let state_ok = match (&expected_state, &query.state) {
        (Some(expected), Some(got)) => tokens_match(expected, got),
        _ => false,
    };
    if !state_ok {
        warn!("oauth callback state mismatch");
        return sign_in_failed(&state, &session, "state mismatch").await;
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return sign_in_failed(&state, &session, "missing code").await;
    };

    let profile = match state.oauth.exchange(code).await {
        Ok(p) => p,
        Err(e) => {
            warn!(provider = state.oauth.name(), "code exchange failed: {e}");
            return sign_in_failed(&state, &session, "code exchange failed").await;
        }
    };

    let user = match users::upsert_from_provider(&state.db, &profile).await {
        Ok(u) => u,
        Err(e) => {
            error!(provider = %profile.provider, uid = %profile.uid, "persist user: {e}");
            return sign_in_failed(&state, &session, "user not persisted").await;
        }
    };

    if let Err(e) = sess::set_user(&session, &user.id, user.display_name()).await {
        error!("session set_user: {e}");
        return sign_in_failed(&state, &session, "session unavailable").await;
    }

    let message = format!("Signed in with {}!", state.oauth.name());
    if let Err(e) = sess::push_flash(&session, Flash::Alert(message)).await {
        warn!("push flash: {e}");
    }
    info!(user_id = %user.id, provider = %user.provider, "sign-in successful");
    audit::record(&state.db, Some(&user.id), audit::EVENT_SIGN_IN, Some(&user.provider)).await;
    Redirect::to("/").into_response()
}

async fn sign_in_failed(state: &AppState, session: &Session, detail: &str) -> Response {
    if let Err(e) = sess::push_flash(session, Flash::Error(SIGN_IN_FAILED_MESSAGE.to_string())).await {
        warn!("push flash: {e}");
    }
    audit::record(&state.db, None, audit::EVENT_SIGN_IN_FAILED, Some(detail)).await;
    Redirect::to("/").into_response()
}

// ── Session ───────────────────────────────────────────────────────────────────

/// POST /auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let user_id = sess::get_user_id(&session).await;
    if let Err(e) = sess::clear(&session).await {
        warn!("session clear: {e}");
    }
    if let Some(user_id) = user_id {
        audit::record(&state.db, Some(&user_id), audit::EVENT_SIGN_OUT, None).await;
    }
    Redirect::to("/").into_response()
}

/// GET /auth/me
///
/// Always 200; `authenticated` tells the caller whether a session exists.
pub async fn me(session: Session) -> Json<MeResponse> {
    let user_id = sess::get_user_id(&session).await;
    let nickname = sess::get_nickname(&session).await;
    Json(MeResponse {
        authenticated: user_id.is_some(),
        user_id,
        nickname,
    })
}
