use crate::constants::{DEFAULT_ALLOWED_END, DEFAULT_ALLOWED_START, DEFAULT_PROFILE_NAME};
use crate::error::AppError;
use crate::models::Category;
use crate::validation::{validate_days_of_week, validate_time_format};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-category "block this category" flags. A missing entry means not blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Restrictions(BTreeMap<Category, bool>);

impl Restrictions {
    /// Harmful categories blocked, lifestyle categories allowed.
    pub fn template() -> Self {
        Self(Category::ALL.into_iter().map(|c| (c, c.is_harmful())).collect())
    }

    pub fn is_blocked(&self, category: Category) -> bool {
        self.0.get(&category).copied().unwrap_or(false)
    }

    pub fn set(&mut self, category: Category, blocked: bool) {
        self.0.insert(category, blocked);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedHours {
    pub start: String,
    pub end: String,
}

/// Entries with an unknown tag or a non-boolean flag are dropped rather than
/// failing the whole profile.
impl<'de> Deserialize<'de> for Restrictions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut flags = BTreeMap::new();
        for (tag, value) in raw {
            if let (Ok(category), Some(blocked)) = (tag.parse::<Category>(), value.as_bool()) {
                flags.insert(category, blocked);
            } else {
                warn!("Ignoring restriction entry {tag}={value}");
            }
        }
        Ok(Self(flags))
    }
}

/// Time-of-day / day-of-week window during which browsing is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestrictions {
    pub enabled: bool,
    pub allowed_hours: AllowedHours,
    /// Day numbers, 1=Monday through 7=Sunday.
    pub allowed_days: Vec<u8>,
}

impl Default for TimeRestrictions {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_hours: AllowedHours {
                start: DEFAULT_ALLOWED_START.to_string(),
                end: DEFAULT_ALLOWED_END.to_string(),
            },
            allowed_days: vec![1, 2, 3, 4, 5, 6, 7],
        }
    }
}

impl TimeRestrictions {
    /// Validate the window and return it with days sorted and deduplicated.
    pub fn validated(mut self) -> Result<Self, AppError> {
        validate_time_format(&self.allowed_hours.start)?;
        validate_time_format(&self.allowed_hours.end)?;
        self.allowed_days = validate_days_of_week(&self.allowed_days)?;
        Ok(self)
    }

    /// Check whether the given day (1=Monday, 7=Sunday) and minute of day fall
    /// inside the allowed window. `start` is inclusive, `end` exclusive, so a
    /// window with `start >= end` permits no minute at all.
    pub fn permits(&self, day: u32, minute: u32) -> Result<bool, AppError> {
        let start = validate_time_format(&self.allowed_hours.start)?;
        let end = validate_time_format(&self.allowed_hours.end)?;
        validate_days_of_week(&self.allowed_days)?;

        let day_allowed = self.allowed_days.iter().any(|d| u32::from(*d) == day);
        let in_hours = start <= minute && minute < end;

        Ok(day_allowed && in_hours)
    }
}

/// Which explicit site list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteList {
    Allowed,
    Blocked,
}

impl SiteList {
    pub fn opposite(self) -> Self {
        match self {
            SiteList::Allowed => SiteList::Blocked,
            SiteList::Blocked => SiteList::Allowed,
        }
    }
}

/// A named bundle of filtering rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub restrictions: Restrictions,
    #[serde(default)]
    pub allowed_sites: Vec<String>,
    #[serde(default)]
    pub blocked_sites: Vec<String>,
    #[serde(default)]
    pub time_restrictions: TimeRestrictions,
}

impl Profile {
    /// Create a profile with a fresh id, the default restriction template,
    /// empty site lists and time restrictions disabled.
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            is_default: false,
            restrictions: Restrictions::template(),
            allowed_sites: Vec::new(),
            blocked_sites: Vec::new(),
            time_restrictions: TimeRestrictions::default(),
        }
    }

    /// The profile seeded on first run.
    pub fn first_run_default() -> Self {
        let mut profile = Self::new(DEFAULT_PROFILE_NAME);
        profile.is_default = true;
        profile
    }

    fn sites_mut(&mut self, list: SiteList) -> &mut Vec<String> {
        match list {
            SiteList::Allowed => &mut self.allowed_sites,
            SiteList::Blocked => &mut self.blocked_sites,
        }
    }

    /// Add an already validated domain to `list`, removing it from the other list.
    pub fn add_site(&mut self, domain: &str, list: SiteList) {
        self.sites_mut(list.opposite()).retain(|d| d != domain);
        let target = self.sites_mut(list);
        if !target.iter().any(|d| d == domain) {
            target.push(domain.to_string());
        }
    }

    /// Remove a domain from `list`. Returns whether it was present.
    pub fn remove_site(&mut self, domain: &str, list: SiteList) -> bool {
        let target = self.sites_mut(list);
        let before = target.len();
        target.retain(|d| d != domain);
        target.len() != before
    }

    /// Bring externally supplied data in line with the store invariants:
    /// entries trimmed and lower-cased, empties and duplicates dropped, and a
    /// domain present in both lists kept only in the allow list.
    pub fn normalize(&mut self) {
        fn clean(sites: &mut Vec<String>) {
            let mut seen = Vec::with_capacity(sites.len());
            for site in sites.drain(..) {
                let site = site.trim().to_ascii_lowercase();
                if !site.is_empty() && !seen.contains(&site) {
                    seen.push(site);
                }
            }
            *sites = seen;
        }

        clean(&mut self.allowed_sites);
        clean(&mut self.blocked_sites);
        let allowed = &self.allowed_sites;
        self.blocked_sites.retain(|d| !allowed.contains(d));
    }
}

/// Fields accepted when creating a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub restrictions: Option<Restrictions>,
    #[serde(default)]
    pub time_restrictions: Option<TimeRestrictions>,
}

impl NewProfile {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Partial update of a profile; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub restrictions: Option<Restrictions>,
    #[serde(default)]
    pub time_restrictions: Option<TimeRestrictions>,
}
