use chrono::Utc;
use shared_types::PageKey;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Page {
    pub id: i64,
    pub chapter: i64,
    pub section: i64,
    pub title: String,
}

impl Page {
    pub fn key(&self) -> PageKey {
        PageKey::new(self.chapter, self.section)
    }
}

pub async fn find(pool: &SqlitePool, key: PageKey) -> Result<Option<Page>, sqlx::Error> {
    sqlx::query_as::<_, Page>(
        "SELECT id, chapter, section, title FROM pages WHERE chapter = ? AND section = ?",
    )
    .bind(key.chapter)
    .bind(key.section)
    .fetch_optional(pool)
    .await
}

/// Case-insensitive title search, in reading order.
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Page>, sqlx::Error> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Page>(
        "SELECT id, chapter, section, title FROM pages
         WHERE instr(lower(title), lower(?)) > 0
         ORDER BY chapter, section",
    )
    .bind(query)
    .fetch_all(pool)
    .await
}

/// Create or retitle a page. Used when importing the content catalog.
pub async fn upsert(pool: &SqlitePool, key: PageKey, title: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO pages (chapter, section, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(chapter, section) DO UPDATE SET title = excluded.title, updated_at = excluded.updated_at",
    )
    .bind(key.chapter)
    .bind(key.section)
    .bind(title)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
