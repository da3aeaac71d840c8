// src/constants.rs

/// Milliseconds in one day (24 * 60 * 60 * 1000)
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Minutes in one day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Maximum number of activity records kept before the oldest are evicted
pub const ACTIVITY_LOG_CAP: usize = 1000;

/// Assumed dwell time per visit record, used for the `timeActive` estimate
pub const MINUTES_PER_VISIT: u64 = 2;

/// Upper bound for a remote categorization round trip
pub const REMOTE_TIMEOUT_MS: u64 = 2000;

/// How long the remote categorizer is skipped after a failed call
pub const REMOTE_RETRY_AFTER_MS: i64 = 60_000;

/// Confidence reported for results that did not come with one
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Maximum profile name length
pub const MAX_PROFILE_NAME_LEN: usize = 100;

/// Maximum domain length (RFC 1035)
pub const MAX_DOMAIN_LEN: usize = 253;

/// Maximum number of trailing days covered by daily statistics
pub const MAX_STATS_DAYS: u32 = 90;

pub const DEFAULT_PROFILE_NAME: &str = "Default Profile";
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:3000/api";
pub const DEFAULT_ALLOWED_START: &str = "09:00";
pub const DEFAULT_ALLOWED_END: &str = "21:00";

/// Extension page a blocked tab is redirected to
pub const BLOCK_PAGE_PATH: &str = "blocked.html";

// Persisted state keys
pub const PROFILES_KEY: &str = "profiles";
pub const CURRENT_PROFILE_KEY: &str = "currentProfile";
pub const SETTINGS_KEY: &str = "settings";
pub const ACTIVITY_LOG_KEY: &str = "activityLogs";
