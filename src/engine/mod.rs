use crate::categorizer::{CategorizationService, CategoryCache, HttpCategorizer, RemoteCategorizer};
use crate::commands::{Command, CommandOutcome, SettingsCommand};
use crate::constants::{ACTIVITY_LOG_CAP, BLOCK_PAGE_PATH, MILLIS_PER_DAY, REMOTE_TIMEOUT_MS};
use crate::error::AppError;
use crate::models::{
    ActivityAction, ActivityRecord, Category, DailyStats, Profile, RiskLevel, Settings, Statistics,
};
use crate::policy::{Decision, Evaluator, Reason, SiteMatching};
use crate::recorder::ActivityRecorder;
use crate::store::{ProfileStore, Storage};
use crate::validation::{validate_domain, validate_stats_days};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use url::{form_urlencoded, Url};

pub struct EngineConfig {
    pub activity_log_cap: usize,
    pub remote_timeout: Duration,
    /// Build an HTTP categorizer from `settings.apiEndpoint`.
    pub use_remote: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activity_log_cap: ACTIVITY_LOG_CAP,
            remote_timeout: Duration::from_millis(REMOTE_TIMEOUT_MS),
            use_remote: true,
        }
    }
}

/// What happened to one navigation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationOutcome {
    pub domain: String,
    pub url: String,
    pub profile_id: Option<String>,
    pub decision: Decision,
    /// Empty when the lists or the time window decided before classification.
    pub categories: Vec<Category>,
    pub risk_level: RiskLevel,
    /// Extension page to redirect to when blocked.
    pub block_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteState {
    Allowed,
    Blocked,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub status: SiteState,
    pub reason: Reason,
    /// Name of the profile the status was computed for.
    pub profile: Option<String>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("PolicyEngine: {context} mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Start of the calendar day containing `now`, in epoch milliseconds.
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map_or_else(
            || now.timestamp_millis() - (now.naive_local() - midnight).num_milliseconds(),
            |start| start.timestamp_millis(),
        )
}

fn block_page_path(domain: &str, reason: Reason) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("domain", domain)
        .append_pair("reason", &reason.to_string())
        .finish();
    format!("{BLOCK_PAGE_PATH}?{query}")
}

/// Ties the store, evaluator, categorization and activity log together.
pub struct PolicyEngine<S: Storage + Clone> {
    store: Mutex<ProfileStore<S>>,
    recorder: Mutex<ActivityRecorder<S>>,
    categorization: CategorizationService,
    config: EngineConfig,
}

impl<S: Storage + Clone> PolicyEngine<S> {
    pub fn new(storage: S, cache: CategoryCache, config: EngineConfig) -> Result<Self, AppError> {
        let store = ProfileStore::load(storage.clone())?;
        let recorder = ActivityRecorder::load(storage, config.activity_log_cap)?;

        let engine = Self {
            store: Mutex::new(store),
            recorder: Mutex::new(recorder),
            categorization: CategorizationService::new(cache),
            config,
        };
        engine.configure_remote();
        Ok(engine)
    }

    pub fn categorization(&self) -> &CategorizationService {
        &self.categorization
    }

    /// Point the remote categorizer at the configured endpoint.
    pub fn configure_remote(&self) {
        if !self.config.use_remote {
            self.categorization.set_remote(None);
            return;
        }

        let endpoint = lock(&self.store, "store").settings().api_endpoint.clone();
        match HttpCategorizer::new(&endpoint, self.config.remote_timeout) {
            Ok(Some(remote)) => {
                info!("Remote categorization via {}", remote.endpoint());
                let remote: Arc<dyn RemoteCategorizer> = Arc::new(remote);
                self.categorization.set_remote(Some(remote));
            }
            Ok(None) => {
                info!("Remote categorization disabled");
                self.categorization.set_remote(None);
            }
            Err(e) => {
                warn!("Remote categorization unavailable: {e}");
                self.categorization.set_remote(None);
            }
        }
    }

    pub fn settings(&self) -> Settings {
        lock(&self.store, "store").settings().clone()
    }

    pub fn active_profile(&self) -> Option<Profile> {
        lock(&self.store, "store").active_profile().cloned()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        lock(&self.store, "store").profiles().to_vec()
    }

    /// Evaluate a navigation and log it. Returns `None` for anything that is
    /// not an http(s) page, such as browser-internal or extension pages.
    pub fn handle_navigation<Tz: TimeZone>(&self, url: &str, now: DateTime<Tz>) -> Option<NavigationOutcome> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping unparsable url {url}: {e}");
                return None;
            }
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let domain = parsed.host_str()?.to_ascii_lowercase();

        let (profile, settings) = {
            let store = lock(&self.store, "store");
            (store.active_profile().cloned(), store.settings().clone())
        };

        let Some(profile) = profile else {
            warn!("No active profile, allowing {domain}");
            return Some(NavigationOutcome {
                domain,
                url: url.to_string(),
                profile_id: None,
                decision: Decision::allow(Reason::AllowedDefault),
                categories: Vec::new(),
                risk_level: RiskLevel::Low,
                block_page: None,
            });
        };

        let now_ms = now.timestamp_millis();
        let evaluator = Evaluator::new(SiteMatching::from_strict_mode(settings.strict_mode));
        let mut classification = None;
        let decision = evaluator.evaluate_with(&profile, &domain, now.naive_local(), || {
            let result = self.categorization.categorize(&domain, url, &profile.id, now_ms);
            let categories = result.categories.clone();
            classification = Some(result);
            categories
        });
        let (categories, risk_level) =
            classification.map_or((Vec::new(), RiskLevel::Low), |c| (c.categories, c.risk_level));

        debug!("{domain} -> block={} reason={}", decision.block, decision.reason);

        if settings.enable_logging {
            let action = if decision.block {
                ActivityAction::Blocked
            } else if decision.reason == Reason::ExplicitlyAllowed {
                ActivityAction::Allowed
            } else {
                ActivityAction::Visited
            };
            let record = ActivityRecord::new(&domain, url, &profile.id, now_ms, action)
                .with_categories(categories.clone());
            if let Err(e) = lock(&self.recorder, "recorder").record(record) {
                warn!("Failed to record activity for {domain}: {e}");
            }
        }

        let block_page = decision.block.then(|| block_page_path(&domain, decision.reason));
        Some(NavigationOutcome {
            domain,
            url: url.to_string(),
            profile_id: Some(profile.id),
            decision,
            categories,
            risk_level,
            block_page,
        })
    }

    /// Evaluate a bare domain against the active profile without recording.
    pub fn check_site_status<Tz: TimeZone>(&self, domain: &str, now: DateTime<Tz>) -> Result<SiteStatus, AppError> {
        let domain = validate_domain(domain)?;
        let url = format!("https://{domain}/");

        let (profile, settings) = {
            let store = lock(&self.store, "store");
            (store.active_profile().cloned(), store.settings().clone())
        };
        let Some(profile) = profile else {
            return Ok(SiteStatus {
                status: SiteState::Allowed,
                reason: Reason::AllowedDefault,
                profile: None,
            });
        };

        let now_ms = now.timestamp_millis();
        let evaluator = Evaluator::new(SiteMatching::from_strict_mode(settings.strict_mode));
        let decision = evaluator.evaluate_with(&profile, &domain, now.naive_local(), || {
            self.categorization
                .categorize(&domain, &url, &profile.id, now_ms)
                .categories
        });

        Ok(SiteStatus {
            status: if decision.block { SiteState::Blocked } else { SiteState::Allowed },
            reason: decision.reason,
            profile: Some(profile.name),
        })
    }

    /// Totals for the active profile since the start of `now`'s day.
    pub fn statistics_today<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Statistics {
        let Some(profile_id) = self.active_profile().map(|p| p.id) else {
            return Statistics::default();
        };
        self.statistics_since(&profile_id, start_of_day(&now))
    }

    pub fn statistics_since(&self, profile_id: &str, since: i64) -> Statistics {
        lock(&self.recorder, "recorder").statistics(profile_id, since)
    }

    /// One bucket per day for the trailing `days` days, ending with today.
    /// `profile_id` defaults to the active profile.
    pub fn daily_stats<Tz: TimeZone>(
        &self,
        profile_id: Option<&str>,
        days: u32,
        now: DateTime<Tz>,
    ) -> Result<Vec<DailyStats>, AppError> {
        let days = validate_stats_days(days)?;
        let profile_id = self.resolve_profile(profile_id)?;
        let first_day_start = start_of_day(&now) - i64::from(days - 1) * MILLIS_PER_DAY;
        Ok(lock(&self.recorder, "recorder").daily_stats(&profile_id, first_day_start, days))
    }

    /// Newest first. `profile_id` defaults to the active profile.
    pub fn recent_activity(
        &self,
        profile_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let profile_id = self.resolve_profile(profile_id)?;
        Ok(lock(&self.recorder, "recorder").recent(&profile_id, limit, offset))
    }

    pub fn clear_activity(&self) -> Result<(), AppError> {
        lock(&self.recorder, "recorder").clear()?;
        info!("Cleared activity log");
        Ok(())
    }

    /// Run a configuration command against the store.
    pub fn execute(&self, command: Command, now: DateTime<Utc>) -> Result<CommandOutcome, AppError> {
        let resets = matches!(command, Command::Settings(SettingsCommand::Reset));

        let outcome = {
            let mut store = lock(&self.store, "store");
            command.execute(&mut store, now)?
        };

        if resets {
            lock(&self.recorder, "recorder").forget();
        }
        if outcome.touches_settings() {
            self.configure_remote();
        }
        Ok(outcome)
    }

    fn resolve_profile(&self, profile_id: Option<&str>) -> Result<String, AppError> {
        match profile_id {
            Some(id) => Ok(id.to_string()),
            None => self
                .active_profile()
                .map(|p| p.id)
                .ok_or(AppError::NotFound { entity: "Profile" }),
        }
    }
}
