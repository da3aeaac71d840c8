use crate::models::{Category, Profile};
use crate::validation::minute_of_day;
use chrono::{Datelike, NaiveDateTime, Timelike};
use log::warn;
use serde::{Serialize, Serializer};
use std::fmt;

/// Why a navigation was allowed or blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    ExplicitlyAllowed,
    ExplicitlyBlocked,
    TimeRestriction,
    BlockedCategory(Category),
    AllowedDefault,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::ExplicitlyAllowed => f.write_str("explicitly_allowed"),
            Reason::ExplicitlyBlocked => f.write_str("explicitly_blocked"),
            Reason::TimeRestriction => f.write_str("time_restriction"),
            Reason::BlockedCategory(category) => write!(f, "blocked_category_{category}"),
            Reason::AllowedDefault => f.write_str("allowed_default"),
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub block: bool,
    pub reason: Reason,
}

impl Decision {
    pub fn allow(reason: Reason) -> Self {
        Self { block: false, reason }
    }

    pub fn block(reason: Reason) -> Self {
        Self { block: true, reason }
    }
}

/// How site-list entries are compared with the navigated domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteMatching {
    /// `domain` contains the entry anywhere.
    #[default]
    Substring,
    /// `domain` equals the entry or ends with `.entry`.
    Suffix,
}

impl SiteMatching {
    pub fn from_strict_mode(strict: bool) -> Self {
        if strict {
            SiteMatching::Suffix
        } else {
            SiteMatching::Substring
        }
    }

    pub fn matches(self, domain: &str, entry: &str) -> bool {
        let entry = entry.trim().to_ascii_lowercase();
        if entry.is_empty() {
            return false;
        }
        let domain = domain.to_ascii_lowercase();

        match self {
            SiteMatching::Substring => domain.contains(&entry),
            SiteMatching::Suffix => {
                domain == entry
                    || domain
                        .strip_suffix(entry.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
        }
    }
}

/// Decides whether a navigation is allowed under a profile. First match wins:
/// allow list, block list, time window, restricted category, default allow.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    matching: SiteMatching,
}

impl Evaluator {
    pub fn new(matching: SiteMatching) -> Self {
        Self { matching }
    }

    pub fn evaluate(
        &self,
        profile: &Profile,
        domain: &str,
        url: &str,
        now: NaiveDateTime,
    ) -> Decision {
        let categorizer = crate::categorizer::Categorizer::new();
        self.evaluate_with(profile, domain, now, || categorizer.classify(domain, url))
    }

    /// Like [`Evaluator::evaluate`], with categorization supplied by the
    /// caller. `classify` only runs when lists and time did not decide.
    pub fn evaluate_with<F>(&self, profile: &Profile, domain: &str, now: NaiveDateTime, classify: F) -> Decision
    where
        F: FnOnce() -> Vec<Category>,
    {
        if self.listed(domain, &profile.allowed_sites) {
            return Decision::allow(Reason::ExplicitlyAllowed);
        }
        if self.listed(domain, &profile.blocked_sites) {
            return Decision::block(Reason::ExplicitlyBlocked);
        }
        if Self::outside_allowed_time(profile, now) {
            return Decision::block(Reason::TimeRestriction);
        }

        classify()
            .into_iter()
            .find(|c| profile.restrictions.is_blocked(*c))
            .map_or(Decision::allow(Reason::AllowedDefault), |c| {
                Decision::block(Reason::BlockedCategory(c))
            })
    }

    fn listed(&self, domain: &str, entries: &[String]) -> bool {
        entries.iter().any(|entry| self.matching.matches(domain, entry))
    }

    fn outside_allowed_time(profile: &Profile, now: NaiveDateTime) -> bool {
        let restrictions = &profile.time_restrictions;
        if !restrictions.enabled {
            return false;
        }

        let day = now.weekday().number_from_monday();
        let minute = minute_of_day(now.hour(), now.minute());
        match restrictions.permits(day, minute) {
            Ok(permitted) => !permitted,
            Err(e) => {
                warn!("Ignoring malformed time restrictions on profile {}: {e}", profile.id);
                false
            }
        }
    }
}
