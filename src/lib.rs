pub mod categorizer;
pub mod commands;
pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod native_host;
pub mod policy;
pub mod recorder;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod validation;

use crate::categorizer::CategoryCache;
use crate::db::{migrations, Database, SharedDatabase};
use crate::engine::{EngineConfig, PolicyEngine};
use directories::ProjectDirs;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Overrides the database location.
pub const DB_PATH_ENV: &str = "FAMILYSHIELD_DB";

/// Error type for FamilyShield initialization failures
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Could not determine project directories")]
    NoProjectDirs,
    #[error("Could not create data directory: {0}")]
    DataDirCreation(#[source] std::io::Error),
    #[error("Failed to open database: {0}")]
    DatabaseOpen(#[source] rusqlite::Error),
    #[error("Failed to run database migrations: {0}")]
    Migration(#[source] rusqlite::Error),
    #[error("Failed to load engine state: {0}")]
    Engine(#[from] error::AppError),
}

/// Database path: `$FAMILYSHIELD_DB` if set, else the platform data directory.
pub fn default_db_path() -> Result<PathBuf, InitError> {
    if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "familyshield", "FamilyShield").ok_or(InitError::NoProjectDirs)?;
    Ok(proj_dirs.data_dir().join("familyshield.db"))
}

/// Open (creating if needed) and migrate the database at `path`.
pub fn open_database(path: &Path) -> Result<SharedDatabase, InitError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(InitError::DataDirCreation)?;
    }

    let db = Database::open(path).map_err(InitError::DatabaseOpen)?;
    migrations::run(db.connection()).map_err(InitError::Migration)?;
    info!("Opened database at {}", path.display());
    Ok(db.into_shared())
}

/// Build an engine whose state and category cache live in the database at `path`.
pub fn open_engine(path: &Path, config: EngineConfig) -> Result<PolicyEngine<SharedDatabase>, InitError> {
    let db = open_database(path)?;
    let cache = CategoryCache::with_database(Arc::clone(&db));
    Ok(PolicyEngine::new(db, cache, config)?)
}
