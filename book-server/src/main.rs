use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use book_server::{
    auth::GithubProvider, config, content::ContentStore, db, session_store, AppState,
    SqliteSessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "book_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    info!(port = config.port, "book server starting");

    // Database
    let db = db::connect(&config.database_url).await?;

    // Page catalog from the content directory, if the authors shipped one.
    let content = ContentStore::new(config.content_dir.clone());
    content.import_catalog(&db).await?;
    info!(path = %content.dir().display(), "content directory");

    // Session store
    let session_store = SqliteSessionStore::new(db.clone());

    // Spawn expired-session cleanup every hour.
    tokio::spawn(session_store::run_expired_session_cleanup(
        session_store.clone(),
        std::time::Duration::from_secs(3600),
    ));

    if config.github.client_id.is_empty() {
        tracing::warn!("GITHUB_CLIENT_ID not set; sign-in will fail until configured");
    }
    let oauth = Arc::new(GithubProvider::new(config.github.clone())?);

    let state = Arc::new(AppState { db, oauth, content });

    let sessions = book_server::session_layer(
        session_store,
        config.secure_cookies,
        config.session_idle_hours,
    );
    let app = book_server::router(state, sessions);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
