//! The annotation store: one opaque payload per (user, page).
//!
//! Writes are whole-payload replacements keyed on the `(user_id, page_id)`
//! unique index, so repeated uploads never create a second row.

use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AnnotationRecord {
    pub id: i64,
    pub user_id: String,
    pub page_id: i64,
    pub annotation: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A user's annotation record joined with the page it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AnnotatedPage {
    pub chapter: i64,
    pub section: i64,
    pub title: String,
    pub annotation: String,
    pub updated_at: i64,
}

pub async fn upsert(
    pool: &SqlitePool,
    user_id: &str,
    page_id: i64,
    payload: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO page_annotations (user_id, page_id, annotation, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(user_id, page_id) DO UPDATE SET
            annotation = excluded.annotation,
            updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(page_id)
    .bind(payload)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(
    pool: &SqlitePool,
    user_id: &str,
    page_id: i64,
) -> Result<Option<AnnotationRecord>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationRecord>(
        "SELECT id, user_id, page_id, annotation, created_at, updated_at
         FROM page_annotations WHERE user_id = ? AND page_id = ?",
    )
    .bind(user_id)
    .bind(page_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AnnotatedPage>, sqlx::Error> {
    sqlx::query_as::<_, AnnotatedPage>(
        "SELECT p.chapter, p.section, p.title, a.annotation, a.updated_at
         FROM page_annotations a JOIN pages p ON a.page_id = p.id
         WHERE a.user_id = ?
         ORDER BY p.chapter, p.section",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_for(pool: &SqlitePool, user_id: &str, page_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM page_annotations WHERE user_id = ? AND page_id = ?")
        .bind(user_id)
        .bind(page_id)
        .fetch_one(pool)
        .await
}

pub async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM page_annotations")
        .fetch_one(pool)
        .await
}
