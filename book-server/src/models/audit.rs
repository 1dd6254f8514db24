use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

pub const EVENT_SIGN_IN: &str = "sign_in";
pub const EVENT_SIGN_IN_FAILED: &str = "sign_in_failed";
pub const EVENT_SIGN_OUT: &str = "sign_out";

/// Append an audit row. Failures are logged and otherwise ignored.
pub async fn record(pool: &SqlitePool, user_id: Option<&str>, event: &str, detail: Option<&str>) {
    let now = Utc::now().timestamp();
    let result = sqlx::query(
        "INSERT INTO audit_log (user_id, event, detail, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(event)
    .bind(detail)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(event, "audit insert failed: {e}");
    }
}

pub async fn count_events(pool: &SqlitePool, event: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE event = ?")
        .bind(event)
        .fetch_one(pool)
        .await
}
