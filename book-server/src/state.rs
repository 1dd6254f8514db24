use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::OAuthProvider;
use crate::content::ContentStore;

pub struct AppState {
    pub db: SqlitePool,
    pub oauth: Arc<dyn OAuthProvider>,
    pub content: ContentStore,
}
