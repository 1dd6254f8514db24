//! Book server: content pages, per-user annotation storage, OAuth sign-in.

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod render;
pub mod session_store;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use shared_types::{ANNOTATE_PATH, FETCH_ANNOTATIONS_PATH};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer};

pub use session_store::SqliteSessionStore;
pub use state::AppState;

/// Session cookies for the given store; idle sessions expire after `idle_hours`.
pub fn session_layer(
    store: SqliteSessionStore,
    secure: bool,
    idle_hours: i64,
) -> SessionManagerLayer<SqliteSessionStore> {
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(idle_hours)))
}

/// Configure all routes.
pub fn router(
    state: Arc<AppState>,
    sessions: SessionManagerLayer<SqliteSessionStore>,
) -> Router {
    let frontend_dist = config::frontend_dist_from_env();

    let signed_in = Router::new()
        .route("/user/profile", get(views::profile))
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    Router::new()
        // Book pages
        .route("/", get(views::index))
        .route("/preface", get(views::preface))
        .route("/chapter/{chapter_id}", get(views::show_chapter))
        .route(
            "/chapter/{chapter_id}/section/{section_id}",
            get(views::show_section),
        )
        .route("/search", get(views::search))
        // Annotation store
        .route(FETCH_ANNOTATIONS_PATH, get(api::annotations::fetch_annotations))
        .route(ANNOTATE_PATH, post(api::annotations::annotate))
        // Auth
        .route("/auth/github", get(auth::handlers::oauth_start))
        .route("/auth/github/callback", get(auth::handlers::oauth_callback))
        .route("/auth/logout", post(auth::handlers::logout))
        .route("/auth/me", get(auth::handlers::me))
        .route("/health", get(api::health_check))
        .merge(signed_in)
        // reader-ui build output
        .nest_service("/wasm", ServeDir::new(format!("{frontend_dist}/wasm")))
        .nest_service("/assets", ServeDir::new(format!("{frontend_dist}/assets")))
        .layer(axum_middleware::from_fn(middleware::verify_csrf))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
