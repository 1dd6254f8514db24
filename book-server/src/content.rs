//! Book content fragments and the page catalog.
//!
//! Content authors drop rendered HTML fragments into the content directory,
//! one per page, named by the page's content id (`chapter1section4.html`).
//! An optional `pages.json` lists page titles and is imported at startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use shared_types::PageKey;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::models::pages;

pub const CATALOG_FILE: &str = "pages.json";

#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    chapter: i64,
    section: i64,
    title: String,
}

impl ContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the HTML fragment for a content id. Missing fragments are `None`.
    pub async fn fragment(&self, content_id: &str) -> Option<String> {
        // Content ids come from PageKey and are always `[a-z0-9]+`.
        if !content_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let path = self.dir.join(format!("{content_id}.html"));
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Some(html),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "reading content fragment failed: {e}");
                }
                None
            }
        }
    }

    /// Upsert every page listed in `pages.json`, if the file exists.
    /// Returns the number of pages imported.
    pub async fn import_catalog(&self, pool: &SqlitePool) -> anyhow::Result<usize> {
        let path = self.dir.join(CATALOG_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid {}: {e}", path.display()))?;

        for entry in &entries {
            pages::upsert(pool, PageKey::new(entry.chapter, entry.section), &entry.title).await?;
        }
        info!(count = entries.len(), "imported page catalog");
        Ok(entries.len())
    }
}
