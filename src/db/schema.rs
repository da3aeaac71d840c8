pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category_cache (
    domain TEXT PRIMARY KEY,
    categories TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.5,
    last_updated INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_category_cache_updated ON category_cache(last_updated);
"#;
