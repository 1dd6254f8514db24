//! Reader sessions (signed-in user, CSRF token, OAuth state, flashes) kept
//! in the book database. The `sessions` table comes from the migrations.

use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    data: String,
    expires_at: i64,
}

fn backend(e: sqlx::Error) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

fn encode(record: &Record) -> session_store::Result<String> {
    serde_json::to_string(&record.data).map_err(|e| session_store::Error::Encode(e.to_string()))
}

impl SessionRow {
    fn into_record(self, id: Id) -> session_store::Result<Record> {
        let decode = |e: String| session_store::Error::Decode(e);
        Ok(Record {
            id,
            data: serde_json::from_str(&self.data).map_err(|e| decode(e.to_string()))?,
            expiry_date: OffsetDateTime::from_unix_timestamp(self.expires_at)
                .map_err(|e| decode(e.to_string()))?,
        })
    }
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Remove sessions past their expiry. Returns how many went.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let data = encode(record)?;
        // A fresh id can collide with a stored one; draw again until it sticks.
        loop {
            let created: Option<String> = sqlx::query_scalar(
                "INSERT INTO sessions (id, data, expires_at) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO NOTHING
                 RETURNING id",
            )
            .bind(record.id.to_string())
            .bind(&data)
            .bind(record.expiry_date.unix_timestamp())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

            if created.is_some() {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, data, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at",
        )
        .bind(record.id.to_string())
        .bind(encode(record)?)
        .bind(record.expiry_date.unix_timestamp())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT data, expires_at FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(session_id.to_string())
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(|row| row.into_record(*session_id))
        .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// Background task: purge expired sessions every `period`.
pub async fn run_expired_session_cleanup(store: SqliteSessionStore, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match store.delete_expired().await {
            Ok(removed) => debug!(removed, "expired sessions purged"),
            Err(e) => error!("session cleanup failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    async fn store() -> (SqliteSessionStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
        let pool = crate::db::connect(&url).await.unwrap();
        (SqliteSessionStore::new(pool), dir)
    }

    fn record(expiry_date: OffsetDateTime) -> Record {
        let mut data = HashMap::new();
        data.insert("user_id".to_string(), serde_json::json!("u-1"));
        Record {
            id: Id::default(),
            data,
            expiry_date,
        }
    }

    #[tokio::test]
    async fn saved_sessions_load_until_they_expire() {
        let (store, _dir) = store().await;
        let now = OffsetDateTime::now_utc();

        let mut live = record(now + time::Duration::hours(1));
        store.create(&mut live).await.unwrap();
        let loaded = store.load(&live.id).await.unwrap().unwrap();
        assert_eq!(loaded.data["user_id"], "u-1");

        let mut stale = record(now - time::Duration::minutes(1));
        store.create(&mut stale).await.unwrap();
        assert!(store.load(&stale.id).await.unwrap().is_none());

        assert_eq!(store.delete_expired().await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 1);

        store.delete(&live.id).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
