use super::{ProfileStore, Storage, StoreState};
use crate::constants::ACTIVITY_LOG_KEY;
use crate::error::AppError;
use crate::models::{Profile, Settings, Snapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;

impl<S: Storage> ProfileStore<S> {
    pub fn export_snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot {
            profiles: self.state.profiles.clone(),
            settings: self.state.settings.clone(),
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Replace profiles, settings and the active pointer with an exported
    /// document. The active profile becomes the imported default, else the first.
    pub fn import_snapshot(&mut self, json: &str) -> Result<(), AppError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let has_profiles = value
            .get("profiles")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|profiles| !profiles.is_empty());
        if !has_profiles {
            return Err(AppError::InvalidInput {
                field: "profiles",
                reason: "must be a non-empty array".into(),
            });
        }

        let snapshot: Snapshot = serde_json::from_value(value)?;
        let mut next = StoreState {
            profiles: snapshot.profiles,
            active_id: None,
            settings: snapshot.settings,
        };
        for profile in &mut next.profiles {
            profile.normalize();
        }
        next.normalize_ids();
        next.normalize_defaults();
        next.active_id = next.fallback_id();

        let count = next.profiles.len();
        self.commit(next, true)?;
        info!("Imported {count} profiles");
        Ok(())
    }

    /// Replace profiles and settings with the first-run defaults, then drop the
    /// activity log. The activity log is only touched once the new profile set
    /// is persisted.
    pub fn reset(&mut self) -> Result<(), AppError> {
        let profile = Profile::first_run_default();
        let next = StoreState {
            active_id: Some(profile.id.clone()),
            profiles: vec![profile],
            settings: Settings::default(),
        };

        self.commit(next, true)?;
        self.storage.remove(&[ACTIVITY_LOG_KEY])?;
        info!("Reset all profiles and settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Category, NewProfile, SiteList};
    use crate::store::{load, MemoryStorage, ProfileStore, Storage};
    use crate::constants::{ACTIVITY_LOG_KEY, PROFILES_KEY};
    use crate::error::AppError;
    use chrono::TimeZone;

    fn store() -> ProfileStore<MemoryStorage> {
        ProfileStore::load(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn test_export_then_import_elsewhere() {
        let mut source = store();
        let id = source.active_id().unwrap().to_string();
        source.add_site(&id, "khanacademy.org", SiteList::Allowed).unwrap();
        source.create_profile(NewProfile::named("Kids")).unwrap();

        let now = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let snapshot = source.export_snapshot(now);
        assert_eq!(snapshot.export_date, "2024-01-01T12:00:00.000Z");
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut target = store();
        target.import_snapshot(&json).unwrap();
        assert_eq!(target.profiles().len(), 2);
        assert_eq!(target.active_id(), Some(id.as_str()));
        assert_eq!(target.active_profile().unwrap().allowed_sites, vec!["khanacademy.org"]);
    }

    #[test]
    fn test_import_requires_profiles() {
        let mut target = store();
        for bad in [r#"{"settings":{}}"#, r#"{"profiles":[]}"#, r#"{"profiles":{}}"#] {
            let err = target.import_snapshot(bad).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput { field: "profiles", .. }));
        }
        assert!(matches!(target.import_snapshot("nope").unwrap_err(), AppError::Json(_)));
        assert_eq!(target.profiles().len(), 1);
    }

    #[test]
    fn test_import_normalizes_invariants() {
        let json = r#"{
            "profiles": [
                {"id": "a", "name": "A", "isDefault": false,
                 "allowedSites": ["Example.com"], "blockedSites": ["example.com", "bad.org"]},
                {"id": "b", "name": "B", "isDefault": true},
                {"id": "c", "name": "C", "isDefault": true}
            ]
        }"#;
        let mut target = store();
        target.import_snapshot(json).unwrap();

        let defaults: Vec<&str> = target
            .profiles()
            .iter()
            .filter(|p| p.is_default)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(defaults, vec!["b"]);
        assert_eq!(target.active_id(), Some("b"));

        let a = target.get("a").unwrap();
        assert_eq!(a.allowed_sites, vec!["example.com"]);
        assert_eq!(a.blocked_sites, vec!["bad.org"]);
        assert!(target.settings().enable_logging);
    }

    #[test]
    fn test_reset_reseeds_default() {
        let storage = MemoryStorage::new();
        let mut store = ProfileStore::load(storage.clone()).unwrap();
        store.create_profile(NewProfile::named("Kids")).unwrap();
        storage.set_many(&[(ACTIVITY_LOG_KEY, "[]".into())]).unwrap();

        store.reset().unwrap();
        assert_eq!(store.profiles().len(), 1);
        let profile = store.active_profile().unwrap();
        assert!(profile.is_default);
        assert!(profile.restrictions.is_blocked(Category::Malware));
        assert!(storage.get(ACTIVITY_LOG_KEY).unwrap().is_none());
    }

    #[test]
    fn test_import_gives_duplicate_ids_fresh_ones() {
        let json = r#"{"profiles": [
            {"id": "a", "name": "First", "isDefault": true},
            {"id": "a", "name": "Second"},
            {"id": "", "name": "Third"}
        ]}"#;
        let storage = MemoryStorage::new();
        let mut target = ProfileStore::load(storage.clone()).unwrap();
        target.import_snapshot(json).unwrap();

        let ids: Vec<&str> = target.profiles().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "a");
        assert!(ids[1] != "a" && !ids[1].is_empty());
        assert!(ids[2] != "a" && !ids[2].is_empty() && ids[2] != ids[1]);

        let second = ids[1].to_string();
        target.delete_profile("a").unwrap();
        assert_eq!(target.profiles().len(), 2);
        assert_eq!(target.active_id(), Some(second.as_str()));

        let reloaded = ProfileStore::load(storage).unwrap();
        assert_eq!(reloaded.profiles().len(), 2);
        assert_eq!(reloaded.active_id(), Some(second.as_str()));
    }

    #[test]
    fn test_failed_reset_keeps_everything() {
        let storage = MemoryStorage::new();
        let mut store = ProfileStore::load(storage.clone()).unwrap();
        store.create_profile(NewProfile::named("Kids")).unwrap();
        storage.set_many(&[(ACTIVITY_LOG_KEY, "[]".into())]).unwrap();
        storage.set_fail_writes(true);

        assert!(matches!(store.reset().unwrap_err(), AppError::Storage(_)));
        assert_eq!(store.profiles().len(), 2);
        let persisted: Option<Vec<serde_json::Value>> = load(&storage, PROFILES_KEY).unwrap();
        assert_eq!(persisted.as_ref().map(Vec::len), Some(2));
        assert!(storage.get(ACTIVITY_LOG_KEY).unwrap().is_some());
    }

    /// Accepts writes but refuses to delete keys.
    #[derive(Clone, Default)]
    struct NoRemoveStorage(MemoryStorage);

    impl Storage for NoRemoveStorage {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.0.get(key)
        }

        fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
            self.0.set_many(entries)
        }

        fn remove(&self, _keys: &[&str]) -> Result<(), AppError> {
            Err(AppError::Storage("remove refused".into()))
        }
    }

    #[test]
    fn test_reset_persists_profiles_before_touching_activity() {
        let storage = NoRemoveStorage::default();
        let mut store = ProfileStore::load(storage.clone()).unwrap();
        store.create_profile(NewProfile::named("Kids")).unwrap();

        assert!(store.reset().is_err());
        assert_eq!(store.profiles().len(), 1);

        let reloaded = ProfileStore::load(storage).unwrap();
        assert_eq!(reloaded.profiles().len(), 1);
        assert_eq!(reloaded.active_id(), store.active_id());
    }
}
