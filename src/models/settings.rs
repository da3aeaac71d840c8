use crate::constants::DEFAULT_API_ENDPOINT;
use crate::models::Profile;
use serde::{Deserialize, Serialize};

/// Extension-wide settings, persisted next to the profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the categorization backend. Empty disables remote lookups.
    pub api_endpoint: String,
    pub enable_logging: bool,
    /// Anchor site-list entries to domain suffixes instead of substring matching.
    pub strict_mode: bool,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            enable_logging: true,
            strict_mode: false,
            notifications: true,
        }
    }
}

/// Full export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub export_date: String,
}
