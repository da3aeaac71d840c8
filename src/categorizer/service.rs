use super::{AnalyzeRequest, Categorizer, CategoryCache, RemoteCategorizer};
use crate::constants::{DEFAULT_CONFIDENCE, REMOTE_RETRY_AFTER_MS};
use crate::models::{Category, CategoryCacheEntry, RiskLevel};
use log::{debug, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Cache,
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub categories: Vec<Category>,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub source: ClassificationSource,
}

impl Classification {
    fn new(categories: Vec<Category>, confidence: f64, source: ClassificationSource) -> Self {
        Self {
            risk_level: RiskLevel::of(&categories),
            categories,
            confidence,
            source,
        }
    }
}

/// Two-tier categorization: memoized remote results first, then the local
/// keyword heuristic. Remote failures are logged and never surfaced; after a
/// failure the remote is skipped for [`REMOTE_RETRY_AFTER_MS`].
pub struct CategorizationService {
    categorizer: Categorizer,
    cache: Mutex<CategoryCache>,
    remote: RwLock<Option<Arc<dyn RemoteCategorizer>>>,
    /// Epoch millis before which the remote is not called. Zero when healthy.
    retry_after_ms: AtomicI64,
}

impl CategorizationService {
    pub fn new(cache: CategoryCache) -> Self {
        Self {
            categorizer: Categorizer::new(),
            cache: Mutex::new(cache),
            remote: RwLock::new(None),
            retry_after_ms: AtomicI64::new(0),
        }
    }

    /// Replace the remote tier; `None` disables it.
    pub fn set_remote(&self, remote: Option<Arc<dyn RemoteCategorizer>>) {
        self.retry_after_ms.store(0, Ordering::SeqCst);
        match self.remote.write() {
            Ok(mut guard) => *guard = remote,
            Err(poisoned) => {
                warn!("Remote categorizer lock was poisoned, recovering");
                *poisoned.into_inner() = remote;
            }
        }
    }

    pub fn has_remote(&self) -> bool {
        self.current_remote().is_some()
    }

    pub fn categorize(&self, domain: &str, url: &str, profile_id: &str, now_ms: i64) -> Classification {
        if let Some(hit) = self.lock_cache().get(domain) {
            debug!("Category cache hit for {domain}");
            return Classification::new(hit.categories, hit.confidence, ClassificationSource::Cache);
        }

        if let Some(remote) = self.available_remote(now_ms) {
            let request = AnalyzeRequest {
                domain,
                url,
                profile_id,
                timestamp: now_ms,
            };
            match remote.analyze(&request) {
                Ok(response) => {
                    let entry = CategoryCacheEntry {
                        domain: domain.to_string(),
                        categories: response.known_categories(),
                        confidence: response.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                        last_updated: now_ms,
                    };
                    let classification = Classification::new(
                        entry.categories.clone(),
                        entry.confidence,
                        ClassificationSource::Remote,
                    );
                    self.retry_after_ms.store(0, Ordering::SeqCst);
                    self.lock_cache().insert(entry);
                    return classification;
                }
                Err(e) => {
                    warn!("Falling back to local categorization for {domain}: {e}");
                    self.retry_after_ms
                        .store(now_ms.saturating_add(REMOTE_RETRY_AFTER_MS), Ordering::SeqCst);
                }
            }
        }

        Classification::new(
            self.categorizer.classify(domain, url),
            DEFAULT_CONFIDENCE,
            ClassificationSource::Local,
        )
    }

    fn available_remote(&self, now_ms: i64) -> Option<Arc<dyn RemoteCategorizer>> {
        let retry_after = self.retry_after_ms.load(Ordering::SeqCst);
        if now_ms < retry_after {
            debug!("Remote categorizer backing off until {retry_after}");
            return None;
        }
        self.current_remote()
    }

    fn current_remote(&self) -> Option<Arc<dyn RemoteCategorizer>> {
        match self.remote.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("Remote categorizer lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, CategoryCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Category cache mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
