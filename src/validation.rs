use crate::constants::{MAX_DOMAIN_LEN, MAX_PROFILE_NAME_LEN, MAX_STATS_DAYS, MINUTES_PER_DAY};
use crate::error::AppError;

/// Validate time format (HH:MM, 24-hour format).
/// Returns Ok(minutes since midnight) if valid.
pub fn validate_time_format(time: &str) -> Result<u32, AppError> {
    let err = |reason: &str| AppError::InvalidInput {
        field: "time",
        reason: reason.into(),
    };

    let (hours, minutes) = match time.split_once(':') {
        Some((h, m)) if h.len() == 2 && m.len() == 2 => (h, m),
        _ => return Err(err("must be in HH:MM format")),
    };
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(err("must be in HH:MM format"));
    }

    let hours: u32 = hours.parse().map_err(|_| err("invalid hours"))?;
    let minutes: u32 = minutes.parse().map_err(|_| err("invalid minutes"))?;

    if hours >= 24 {
        return Err(err("hours must be 00-23"));
    }
    if minutes >= 60 {
        return Err(err("minutes must be 00-59"));
    }

    Ok(hours * 60 + minutes)
}

/// Validate a set of weekday numbers (1=Monday, 7=Sunday).
/// Returns the days sorted with duplicates removed.
pub fn validate_days_of_week(days: &[u8]) -> Result<Vec<u8>, AppError> {
    if let Some(day) = days.iter().find(|d| !(1..=7).contains(*d)) {
        return Err(AppError::InvalidInput {
            field: "allowed_days",
            reason: format!("day must be 1-7, got {day}"),
        });
    }

    let mut days = days.to_vec();
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

/// Validate a bare hostname (no scheme, no path) and return it normalized
/// to lower case.
///
/// Accepts dot separated labels of ASCII letters, digits and hyphens where
/// the final label is alphabetic and at least two characters long.
pub fn validate_domain(domain: &str) -> Result<String, AppError> {
    let normalized = domain.trim().to_ascii_lowercase();
    let invalid = || AppError::InvalidDomain {
        domain: domain.trim().to_string(),
    };

    if normalized.is_empty() || normalized.len() > MAX_DOMAIN_LEN {
        return Err(invalid());
    }

    let labels: Vec<&str> = normalized.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid());
    }

    let well_formed = labels
        .iter()
        .all(|l| !l.is_empty() && l.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-'));
    if !well_formed {
        return Err(invalid());
    }

    match labels.last() {
        Some(tld) if tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()) => {
            Ok(normalized)
        }
        _ => Err(invalid()),
    }
}

/// Validate profile name.
pub fn validate_profile_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput {
            field: "name",
            reason: "cannot be empty".into(),
        });
    }
    if name.chars().count() > MAX_PROFILE_NAME_LEN {
        return Err(AppError::InvalidInput {
            field: "name",
            reason: format!("cannot exceed {MAX_PROFILE_NAME_LEN} characters"),
        });
    }
    Ok(name)
}

/// Validate the number of trailing days requested for daily statistics.
pub fn validate_stats_days(days: u32) -> Result<u32, AppError> {
    if days == 0 || days > MAX_STATS_DAYS {
        return Err(AppError::InvalidInput {
            field: "days",
            reason: format!("must be 1-{MAX_STATS_DAYS}"),
        });
    }
    Ok(days)
}

/// Minutes since midnight for a `hour:minute` wall-clock reading.
pub fn minute_of_day(hour: u32, minute: u32) -> u32 {
    (hour * 60 + minute) % MINUTES_PER_DAY
}
