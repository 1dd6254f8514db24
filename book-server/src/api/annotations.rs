use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use shared_types::{AnnotationQuery, AnnotationUpload};
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::auth::session as sess;
use crate::error::{AppError, AppResult};
use crate::models::{annotations, pages};
use crate::AppState;

/// GET /fetch_annotations?chapter=&section=
///
/// JSON requests get the stored payload as a JSON string, or `null` when
/// there is no session, no such page, or no record. Anything else is
/// redirected home.
pub async fn fetch_annotations(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<AnnotationQuery>,
) -> AppResult<Response> {
    if !wants_json(&headers) {
        return Ok(Redirect::to("/").into_response());
    }

    let Some(user_id) = sess::get_user_id(&session).await else {
        return Ok(Json(None::<String>).into_response());
    };

    let Some(page) = pages::find(&state.db, query.page()).await? else {
        debug!(chapter = query.chapter, section = query.section, "fetch for unknown page");
        return Ok(Json(None::<String>).into_response());
    };

    let payload = annotations::find(&state.db, &user_id, page.id)
        .await?
        .map(|record| record.annotation);
    Ok(Json(payload).into_response())
}

/// POST /annotate
///
/// Replaces the signed-in user's whole annotation payload for the page.
/// Anonymous uploads are accepted and dropped without reading the body.
pub async fn annotate(
    State(state): State<Arc<AppState>>,
    session: Session,
    upload: Result<Form<AnnotationUpload>, FormRejection>,
) -> AppResult<Response> {
    let Some(user_id) = sess::get_user_id(&session).await else {
        debug!("ignoring annotation upload from anonymous session");
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let Form(upload) = match upload {
        Ok(form) => form,
        Err(rejection) => {
            warn!(user_id = %user_id, "malformed annotation upload: {rejection}");
            return Ok(rejection.into_response());
        }
    };

    let page = pages::find(&state.db, upload.page())
        .await?
        .ok_or(AppError::NotFound)?;

    annotations::upsert(&state.db, &user_id, page.id, &upload.annotation).await?;
    info!(
        user_id = %user_id,
        chapter = upload.chapter,
        section = upload.section,
        bytes = upload.annotation.len(),
        "annotation saved"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn wants_json_reads_accept() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        assert!(wants_json(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));
    }
}
