pub mod activity;
pub mod cache_entry;
pub mod category;
pub mod profile;
pub mod settings;

pub use activity::{ActivityAction, ActivityRecord, DailyStats, Statistics};
pub use cache_entry::CategoryCacheEntry;
pub use category::{Category, RiskLevel};
pub use profile::{AllowedHours, NewProfile, Profile, ProfilePatch, Restrictions, SiteList, TimeRestrictions};
pub use settings::{Settings, Snapshot};
