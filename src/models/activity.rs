use crate::models::Category;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Visited,
    Allowed,
    Blocked,
}

impl ActivityAction {
    /// Whether the page was actually shown.
    pub fn is_visit(self) -> bool {
        matches!(self, ActivityAction::Visited | ActivityAction::Allowed)
    }
}

/// One logged navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,
    pub domain: String,
    pub url: String,
    pub profile_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub action: ActivityAction,
}

impl ActivityRecord {
    pub fn new(
        domain: &str,
        url: &str,
        profile_id: &str,
        timestamp: i64,
        action: ActivityAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            url: url.to_string(),
            profile_id: profile_id.to_string(),
            timestamp,
            categories: Vec::new(),
            action,
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }
}

/// Per-profile totals over a time range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Distinct domains that were shown.
    pub sites_visited: usize,
    /// Every block event counts.
    pub sites_blocked: usize,
    /// Rough estimate in minutes; there is no session-end signal.
    pub time_active: u64,
}

/// Totals for one day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Start of the day bucket, epoch milliseconds.
    pub date: i64,
    pub total_visits: usize,
    pub unique_domains: usize,
    pub sites_blocked: usize,
}
