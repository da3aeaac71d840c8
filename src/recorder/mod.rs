use crate::constants::{ACTIVITY_LOG_KEY, MILLIS_PER_DAY, MINUTES_PER_VISIT};
use crate::error::AppError;
use crate::models::{ActivityAction, ActivityRecord, DailyStats, Statistics};
use crate::store::Storage;
use log::{debug, warn};
use std::collections::{HashSet, VecDeque};
use std::iter;

/// Bounded, append-only activity log shared by all profiles on the device.
///
/// Writes persist the would-be log first and only then update memory, so a
/// storage failure leaves the in-memory log untouched.
pub struct ActivityRecorder<S: Storage> {
    storage: S,
    log: VecDeque<ActivityRecord>,
    cap: usize,
}

impl<S: Storage> ActivityRecorder<S> {
    /// Load the persisted log. A corrupt log is discarded with a warning.
    pub fn load(storage: S, cap: usize) -> Result<Self, AppError> {
        let mut log: VecDeque<ActivityRecord> = match storage.get(ACTIVITY_LOG_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<ActivityRecord>>(&raw)
                .map(VecDeque::from)
                .unwrap_or_else(|e| {
                    warn!("Discarding unreadable activity log: {e}");
                    VecDeque::new()
                }),
            None => VecDeque::new(),
        };

        while log.len() > cap {
            log.pop_front();
        }

        Ok(Self { storage, log, cap })
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Oldest first.
    pub fn records(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.log.iter()
    }

    /// Append a record, evicting the oldest so that at most `cap` remain.
    pub fn record(&mut self, record: ActivityRecord) -> Result<(), AppError> {
        let skip = (self.log.len() + 1).saturating_sub(self.cap);
        let would_be: Vec<&ActivityRecord> = self
            .log
            .iter()
            .chain(iter::once(&record))
            .skip(skip)
            .collect();
        let raw = serde_json::to_string(&would_be)?;
        self.storage.set_many(&[(ACTIVITY_LOG_KEY, raw)])?;

        debug!("Recorded {:?} {} for profile {}", record.action, record.domain, record.profile_id);
        self.log.push_back(record);
        while self.log.len() > self.cap {
            self.log.pop_front();
        }
        Ok(())
    }

    /// Totals for `profile_id` over records at or after `since` (epoch ms).
    pub fn statistics(&self, profile_id: &str, since: i64) -> Statistics {
        Self::summarize(
            self.log
                .iter()
                .filter(|r| r.profile_id == profile_id && r.timestamp >= since),
        )
    }

    /// One bucket per day starting at `first_day_start` (epoch ms), oldest first.
    pub fn daily_stats(&self, profile_id: &str, first_day_start: i64, days: u32) -> Vec<DailyStats> {
        (0..i64::from(days))
            .map(|i| {
                let start = first_day_start + i * MILLIS_PER_DAY;
                let end = start + MILLIS_PER_DAY;
                let bucket = self.log.iter().filter(|r| {
                    r.profile_id == profile_id && r.timestamp >= start && r.timestamp < end
                });

                let mut domains = HashSet::new();
                let mut total_visits = 0;
                let mut sites_blocked = 0;
                for record in bucket {
                    if record.action.is_visit() {
                        total_visits += 1;
                        domains.insert(record.domain.as_str());
                    } else {
                        sites_blocked += 1;
                    }
                }

                DailyStats {
                    date: start,
                    total_visits,
                    unique_domains: domains.len(),
                    sites_blocked,
                }
            })
            .collect()
    }

    /// Page of `profile_id`'s records, newest first.
    pub fn recent(&self, profile_id: &str, limit: usize, offset: usize) -> Vec<ActivityRecord> {
        self.log
            .iter()
            .rev()
            .filter(|r| r.profile_id == profile_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.storage.remove(&[ACTIVITY_LOG_KEY])?;
        self.log.clear();
        Ok(())
    }

    /// Drop the in-memory log after the backing storage was wiped elsewhere.
    pub(crate) fn forget(&mut self) {
        self.log.clear();
    }

    fn summarize<'a>(records: impl Iterator<Item = &'a ActivityRecord>) -> Statistics {
        let mut domains = HashSet::new();
        let mut visits: u64 = 0;
        let mut sites_blocked = 0;

        for record in records {
            match record.action {
                ActivityAction::Visited | ActivityAction::Allowed => {
                    visits += 1;
                    domains.insert(record.domain.as_str());
                }
                ActivityAction::Blocked => sites_blocked += 1,
            }
        }

        Statistics {
            sites_visited: domains.len(),
            sites_blocked,
            time_active: visits * MINUTES_PER_VISIT,
        }
    }
}
