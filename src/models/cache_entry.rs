use crate::error::AppError;
use crate::models::Category;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Memoized categorization result for one exact domain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCacheEntry {
    pub domain: String,
    pub categories: Vec<Category>,
    pub confidence: f64,
    /// Milliseconds since the Unix epoch.
    pub last_updated: i64,
}

impl CategoryCacheEntry {
    pub fn find(conn: &Connection, domain: &str) -> Result<Option<Self>, AppError> {
        let row: Option<(String, String, f64, i64)> = conn
            .query_row(
                "SELECT domain, categories, confidence, last_updated
                 FROM category_cache WHERE domain = ?1",
                params![domain],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(|(domain, categories, confidence, last_updated)| {
            Ok(Self {
                domain,
                categories: serde_json::from_str(&categories)?,
                confidence,
                last_updated,
            })
        })
        .transpose()
    }

    /// Insert or replace; last write wins.
    pub fn save(&self, conn: &Connection) -> Result<(), AppError> {
        conn.execute(
            "INSERT OR REPLACE INTO category_cache (domain, categories, confidence, last_updated)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.domain,
                serde_json::to_string(&self.categories)?,
                self.confidence,
                self.last_updated,
            ],
        )?;
        Ok(())
    }

    pub fn count(conn: &Connection) -> Result<i64, AppError> {
        Ok(conn.query_row("SELECT COUNT(*) FROM category_cache", [], |row| row.get(0))?)
    }
}
