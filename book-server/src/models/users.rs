use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::{generate_credential, ProviderProfile};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub provider: String,
    pub uid: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Name shown in the navigation bar and on the profile page.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

const USER_COLUMNS: &str =
    "id, provider, uid, nickname, email, avatar_url, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_provider(
    pool: &SqlitePool,
    provider: &str,
    uid: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE provider = ? AND uid = ?"
    ))
    .bind(provider)
    .bind(uid)
    .fetch_optional(pool)
    .await
}

/// Find the user for a provider identity, creating it on first sign-in.
///
/// A returning user keeps the stored profile; only `updated_at` moves.
pub async fn upsert_from_provider(
    pool: &SqlitePool,
    profile: &ProviderProfile,
) -> anyhow::Result<User> {
    let now = Utc::now().timestamp();

    if let Some(existing) = find_by_provider(pool, &profile.provider, &profile.uid).await? {
        sqlx::query("UPDATE users SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(&existing.id)
            .execute(pool)
            .await?;
        return Ok(User {
            updated_at: now,
            ..existing
        });
    }

    let id = Uuid::new_v4().to_string();
    let credential = generate_credential()?;
    sqlx::query(
        "INSERT OR IGNORE INTO users
            (id, provider, uid, nickname, email, avatar_url, encrypted_credential, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&profile.provider)
    .bind(&profile.uid)
    .bind(&profile.nickname)
    .bind(&profile.email)
    .bind(&profile.avatar_url)
    .bind(&credential)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    // A concurrent first sign-in may have won the insert; read back whichever row exists.
    find_by_provider(pool, &profile.provider, &profile.uid)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {}/{} missing after insert", profile.provider, profile.uid))
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}
