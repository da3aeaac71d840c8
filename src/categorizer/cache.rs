use crate::db::{with_connection, SharedDatabase};
use crate::models::CategoryCacheEntry;
use log::warn;
use std::collections::HashMap;

/// Per-domain memo of remote categorization results.
///
/// Entries live in memory and, when a database is attached, are read from and
/// written through to the `category_cache` table. Database failures degrade
/// to a memory-only cache.
#[derive(Default)]
pub struct CategoryCache {
    entries: HashMap<String, CategoryCacheEntry>,
    db: Option<SharedDatabase>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(db: SharedDatabase) -> Self {
        Self {
            entries: HashMap::new(),
            db: Some(db),
        }
    }

    pub fn get(&mut self, domain: &str) -> Option<CategoryCacheEntry> {
        if let Some(entry) = self.entries.get(domain) {
            return Some(entry.clone());
        }

        let db = self.db.as_ref()?;
        match with_connection(db, "load category cache entry", |conn| {
            CategoryCacheEntry::find(conn, domain)
        }) {
            Ok(Some(entry)) => {
                self.entries.insert(domain.to_string(), entry.clone());
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Category cache lookup for {domain} failed: {e}");
                None
            }
        }
    }

    /// Upsert; last write wins.
    pub fn insert(&mut self, entry: CategoryCacheEntry) {
        if let Some(db) = &self.db {
            if let Err(e) = with_connection(db, "save category cache entry", |conn| entry.save(conn)) {
                warn!("Category cache write for {} failed: {e}", entry.domain);
            }
        }
        self.entries.insert(entry.domain.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::test_utils::setup_test_db;
    use std::sync::Arc;

    fn entry(domain: &str, categories: Vec<Category>) -> CategoryCacheEntry {
        CategoryCacheEntry {
            domain: domain.into(),
            categories,
            confidence: 0.8,
            last_updated: 1,
        }
    }

    #[test]
    fn test_memory_cache() {
        let mut cache = CategoryCache::new();
        assert!(cache.get("site.com").is_none());

        cache.insert(entry("site.com", vec![Category::News]));
        cache.insert(entry("site.com", vec![Category::Shopping]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("site.com").unwrap().categories, vec![Category::Shopping]);
    }

    #[test]
    fn test_write_through_survives_new_cache() {
        let (db, _dir) = setup_test_db();
        let db = db.into_shared();

        let mut cache = CategoryCache::with_database(Arc::clone(&db));
        cache.insert(entry("casino.com", vec![Category::Gambling]));

        let mut reopened = CategoryCache::with_database(db);
        assert!(reopened.is_empty());
        let found = reopened.get("casino.com").unwrap();
        assert_eq!(found.categories, vec![Category::Gambling]);
        assert_eq!(reopened.len(), 1);
    }
}
