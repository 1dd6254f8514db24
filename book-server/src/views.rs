//! HTML page routes: home, preface, chapters, sections, search, profile.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shared_types::{payload_is_empty, PageKey};
use tower_sessions::Session;
use tracing::warn;

use crate::auth::session::{self as sess, Flash};
use crate::error::{AppError, AppResult};
use crate::models::{annotations, pages, users};
use crate::render::{escape_html, link_list, render_page, Chrome, PageView};
use crate::AppState;

const HOME_TITLE: &str =
    "Engineering Software as a Service: An Agile Approach Using Cloud Computing";
const MISSING_CONTENT: &str =
    r#"<p class="missing-content">This page has not been published yet.</p>"#;

/// Per-request chrome: CSRF token, signed-in nickname, pending flashes.
pub async fn chrome(session: &Session) -> AppResult<Chrome> {
    Ok(Chrome {
        csrf_token: sess::csrf_token(session).await?,
        nickname: sess::get_nickname(session).await,
        flashes: sess::take_flash(session).await,
    })
}

/// GET /
pub async fn index(State(state): State<Arc<AppState>>, session: Session) -> AppResult<Html<String>> {
    content_page(&state, &session, PageKey::HOME, Some(HOME_TITLE)).await
}

/// GET /preface
pub async fn preface(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Html<String>> {
    content_page(&state, &session, PageKey::PREFACE, Some("Preface")).await
}

/// GET /chapter/{chapter_id}
pub async fn show_chapter(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(chapter_id): Path<i64>,
) -> AppResult<Html<String>> {
    content_page(&state, &session, PageKey::chapter_level(chapter_id), None).await
}

/// GET /chapter/{chapter_id}/section/{section_id}
pub async fn show_section(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((chapter_id, section_id)): Path<(i64, i64)>,
) -> AppResult<Html<String>> {
    content_page(&state, &session, PageKey::new(chapter_id, section_id), None).await
}

/// Render a book page. `fallback_title` lets home and preface render before
/// their rows exist; chapters and sections must be in the pages table.
async fn content_page(
    state: &AppState,
    session: &Session,
    key: PageKey,
    fallback_title: Option<&str>,
) -> AppResult<Html<String>> {
    let title = match (pages::find(&state.db, key).await?, fallback_title) {
        (Some(page), _) => page.title,
        (None, Some(title)) => title.to_string(),
        (None, None) => return Err(AppError::NotFound),
    };

    let body = match key.content_id() {
        Some(id) => state.content.fragment(&id).await,
        None => None,
    }
    .unwrap_or_else(|| MISSING_CONTENT.to_string());

    let view = PageView {
        title: key.heading_title(&title),
        page: key,
        heading: title,
        body,
        annotatable: true,
    };
    Ok(render_page(&view, &chrome(session).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /search?q=
pub async fn search(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let results = pages::search(&state.db, &query.q).await?;
    let links: Vec<(String, String)> = results
        .iter()
        .filter_map(|p| {
            let key = p.key();
            key.path().map(|path| (key.listing_title(&p.title), path))
        })
        .collect();

    let body = if query.q.trim().is_empty() {
        r#"<p class="empty">Type a word or phrase to search the book.</p>"#.to_string()
    } else {
        link_list(&links, &format!("No pages match \"{}\".", query.q))
    };

    let title = format!("Search the Book - {} ", query.q);
    let view = PageView {
        heading: title.clone(),
        title,
        page: PageKey::new(-1, -1),
        body,
        annotatable: false,
    };
    Ok(render_page(&view, &chrome(&session).await?))
}

/// GET /user/profile: the signed-in reader's annotated pages.
pub async fn profile(State(state): State<Arc<AppState>>, session: Session) -> AppResult<Response> {
    let Some(user_id) = sess::get_user_id(&session).await else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(user) = users::find_by_id(&state.db, &user_id).await? else {
        // Session outlived its user row.
        warn!(user_id = %user_id, "session references a missing user");
        sess::clear(&session).await?;
        return Ok(Redirect::to("/").into_response());
    };

    let records = annotations::list_for_user(&state.db, &user.id).await?;
    let links: Vec<(String, String)> = records
        .iter()
        .filter(|r| !payload_is_empty(&r.annotation))
        .filter_map(|r| {
            let key = PageKey::new(r.chapter, r.section);
            key.path().map(|path| (key.listing_title(&r.title), path))
        })
        .collect();

    let mut body = format!(
        "<h2>Annotated pages</h2>\n{}",
        link_list(&links, "You have not annotated any pages yet.")
    );
    if let Some(email) = &user.email {
        body = format!(r#"<p class="email">{}</p>{body}"#, escape_html(email));
    }

    let title = format!("{}'s User Page", user.display_name());
    let view = PageView {
        heading: title.clone(),
        title,
        page: PageKey::new(0, -1),
        body,
        annotatable: false,
    };
    Ok(render_page(&view, &chrome(&session).await?).into_response())
}

/// Flash shown when a signed-in-only page is requested anonymously.
pub fn sign_in_required() -> Flash {
    Flash::Error("You need to sign in before continuing.".to_string())
}
