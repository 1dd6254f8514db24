use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use shared_types::CSRF_HEADER;
use tower_sessions::Session;
use tracing::warn;

use crate::auth::session as sess;
use crate::auth::tokens_match;
use crate::error::AppError;

/// Form field carrying the token for plain HTML form posts.
pub const CSRF_FORM_FIELD: &str = "authenticity_token";

/// Largest form body buffered while looking for the token.
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// Middleware: reject state-changing requests that do not echo the
/// session's anti-forgery token, either in `X-CSRF-Token` or in the
/// `authenticity_token` form field.
pub async fn verify_csrf(session: Session, req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    let path = req.uri().path().to_string();
    let Some(expected) = sess::stored_csrf_token(&session).await else {
        warn!(path, "state-changing request from a session without a token");
        return AppError::InvalidAuthenticityToken.into_response();
    };

    if let Some(candidate) = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        if tokens_match(&expected, candidate) {
            return next.run(req).await;
        }
        warn!(path, "authenticity token header mismatch");
        return AppError::InvalidAuthenticityToken.into_response();
    }

    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let (parts, body) = req.into_parts();
        let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
            Ok(b) => b,
            Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        };
        let valid = url::form_urlencoded::parse(&bytes)
            .any(|(k, v)| k == CSRF_FORM_FIELD && tokens_match(&expected, &v));
        if valid {
            return next.run(Request::from_parts(parts, Body::from(bytes))).await;
        }
    }

    warn!(path, "rejected request without a valid authenticity token");
    AppError::InvalidAuthenticityToken.into_response()
}

/// Middleware: signed-in pages. Anonymous requests go home with a flash.
pub async fn require_auth(session: Session, req: Request, next: Next) -> Response {
    if sess::get_user_id(&session).await.is_none() {
        if let Err(e) = sess::push_flash(&session, crate::views::sign_in_required()).await {
            warn!("push flash: {e}");
        }
        return Redirect::to("/").into_response();
    }

    next.run(req).await
}
