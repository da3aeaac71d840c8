pub mod snapshot;
pub mod storage;

pub use storage::{load, MemoryStorage, Storage};

use crate::constants::{CURRENT_PROFILE_KEY, PROFILES_KEY, SETTINGS_KEY};
use crate::error::AppError;
use crate::models::{Category, NewProfile, Profile, ProfilePatch, Settings, SiteList, TimeRestrictions};
use crate::validation::{validate_domain, validate_profile_name};
use log::{info, warn};
use std::collections::HashSet;
use uuid::Uuid;

/// In-memory state guarded by the store. Mutations build a new copy.
#[derive(Debug, Clone, Default)]
struct StoreState {
    profiles: Vec<Profile>,
    active_id: Option<String>,
    settings: Settings,
}

impl StoreState {
    fn find(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Profile, AppError> {
        self.profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound { entity: "Profile" })
    }

    /// The default profile if there is one, else the first.
    fn fallback_id(&self) -> Option<String> {
        self.profiles
            .iter()
            .find(|p| p.is_default)
            .or_else(|| self.profiles.first())
            .map(|p| p.id.clone())
    }

    fn make_default(&mut self, id: &str) {
        for profile in &mut self.profiles {
            profile.is_default = profile.id == id;
        }
    }

    /// Give a fresh id to any profile whose id is blank or already taken.
    fn normalize_ids(&mut self) {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.profiles.len());
        for profile in &mut self.profiles {
            if profile.id.trim().is_empty() || seen.contains(&profile.id) {
                let fresh = Uuid::new_v4().to_string();
                warn!("Reassigning profile id {:?} to {fresh}", profile.id);
                profile.id = fresh;
            }
            seen.insert(profile.id.clone());
        }
    }

    /// Keep at most one default; the first one wins.
    fn normalize_defaults(&mut self) {
        let mut seen = false;
        for profile in &mut self.profiles {
            if profile.is_default {
                profile.is_default = !seen;
                seen = true;
            }
        }
    }
}

/// Decode a persisted profile array entry by entry, dropping what does not decode.
fn decode_profiles(raw: &str) -> Vec<Profile> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable profile list: {e}");
        Vec::new()
    });
    entries
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value(entry)
                .map_err(|e| warn!("Dropping unreadable profile: {e}"))
                .ok()
        })
        .collect()
}

/// Owns profiles, the active-profile pointer and settings, persisted through
/// an injected [`Storage`].
pub struct ProfileStore<S: Storage> {
    storage: S,
    state: StoreState,
}

impl<S: Storage> ProfileStore<S> {
    /// Load persisted state, seeding the default profile on first run.
    ///
    /// Unreadable entries never stop the store from loading: a profile that
    /// does not decode is dropped, unreadable settings fall back to defaults,
    /// and if no usable profile remains the default profile is seeded again.
    pub fn load(storage: S) -> Result<Self, AppError> {
        let persisted = storage.get(PROFILES_KEY)?;
        let active_id: Option<Option<String>> = load(&storage, CURRENT_PROFILE_KEY)?;
        let settings: Option<Settings> = load(&storage, SETTINGS_KEY)?;

        let first_run = persisted.is_none();
        let mut state = StoreState {
            profiles: persisted.as_deref().map(decode_profiles).unwrap_or_default(),
            active_id: active_id.flatten(),
            settings: settings.unwrap_or_default(),
        };
        state.normalize_ids();
        state.normalize_defaults();

        let needs_seed = state.profiles.is_empty();
        let mut store = Self { storage, state };
        if needs_seed {
            if first_run {
                info!("No profiles found, seeding the default profile");
            } else {
                warn!("No usable profiles in storage, seeding the default profile");
            }
            store.seed_default()?;
        }
        Ok(store)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.state.profiles
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.state.find(id)
    }

    /// The profile behind the active pointer; a dangling pointer falls back
    /// to the default profile, then the first profile.
    pub fn active_profile(&self) -> Option<&Profile> {
        self.state
            .active_id
            .as_deref()
            .and_then(|id| self.state.find(id))
            .or_else(|| self.state.profiles.iter().find(|p| p.is_default))
            .or_else(|| self.state.profiles.first())
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_profile().map(|p| p.id.as_str())
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn set_active(&mut self, id: &str) -> Result<&Profile, AppError> {
        let mut next = self.state.clone();
        next.find_mut(id)?;
        next.active_id = Some(id.to_string());
        self.commit(next, false)?;
        info!("Switched active profile to {id}");
        self.require(id)
    }

    pub fn create_profile(&mut self, input: NewProfile) -> Result<Profile, AppError> {
        let name = validate_profile_name(&input.name)?;
        let time_restrictions = input.time_restrictions.map(TimeRestrictions::validated).transpose()?;

        let mut profile = Profile::new(name);
        profile.description = input.description;
        if let Some(restrictions) = input.restrictions {
            profile.restrictions = restrictions;
        }
        if let Some(time_restrictions) = time_restrictions {
            profile.time_restrictions = time_restrictions;
        }

        let mut next = self.state.clone();
        let becomes_default = input.is_default || next.profiles.is_empty();
        next.profiles.push(profile.clone());
        if becomes_default {
            next.make_default(&profile.id);
        }
        if next.active_id.as_deref().and_then(|id| next.find(id)).is_none() {
            next.active_id = Some(profile.id.clone());
        }
        self.commit(next, false)?;

        info!("Created profile {} ({})", profile.name, profile.id);
        self.require(&profile.id).cloned()
    }

    pub fn update_profile(&mut self, id: &str, patch: ProfilePatch) -> Result<Profile, AppError> {
        let name = patch.name.as_deref().map(validate_profile_name).transpose()?;
        let time_restrictions = patch.time_restrictions.map(TimeRestrictions::validated).transpose()?;

        let mut next = self.state.clone();
        let profile = next.find_mut(id)?;
        if let Some(name) = name {
            profile.name = name.to_string();
        }
        if let Some(description) = patch.description {
            profile.description = Some(description);
        }
        if let Some(restrictions) = patch.restrictions {
            profile.restrictions = restrictions;
        }
        if let Some(time_restrictions) = time_restrictions {
            profile.time_restrictions = time_restrictions;
        }
        match patch.is_default {
            Some(true) => next.make_default(id),
            Some(false) => next.find_mut(id)?.is_default = false,
            None => {}
        }
        self.commit(next, false)?;
        self.require(id).cloned()
    }

    pub fn delete_profile(&mut self, id: &str) -> Result<(), AppError> {
        let mut next = self.state.clone();
        next.find_mut(id)?;
        if next.profiles.len() == 1 {
            return Err(AppError::DeleteFailed {
                reason: "at least one profile must remain".into(),
            });
        }

        next.profiles.retain(|p| p.id != id);
        if next.active_id.as_deref() == Some(id) {
            next.active_id = next.fallback_id();
        }
        self.commit(next, false)?;
        info!("Deleted profile {id}");
        Ok(())
    }

    pub fn add_site(&mut self, profile_id: &str, domain: &str, list: SiteList) -> Result<Profile, AppError> {
        let domain = validate_domain(domain)?;
        let mut next = self.state.clone();
        next.find_mut(profile_id)?.add_site(&domain, list);
        self.commit(next, false)?;
        self.require(profile_id).cloned()
    }

    /// Absent domains are a no-op; only an unknown profile is an error.
    pub fn remove_site(&mut self, profile_id: &str, domain: &str, list: SiteList) -> Result<Profile, AppError> {
        let domain = domain.trim().to_ascii_lowercase();
        let mut next = self.state.clone();
        if next.find_mut(profile_id)?.remove_site(&domain, list) {
            self.commit(next, false)?;
        }
        self.require(profile_id).cloned()
    }

    pub fn set_category_restriction(
        &mut self,
        profile_id: &str,
        tag: &str,
        blocked: bool,
    ) -> Result<Profile, AppError> {
        let category: Category = tag.parse()?;
        let mut next = self.state.clone();
        next.find_mut(profile_id)?.restrictions.set(category, blocked);
        self.commit(next, false)?;
        self.require(profile_id).cloned()
    }

    pub fn set_time_restrictions(
        &mut self,
        profile_id: &str,
        restrictions: TimeRestrictions,
    ) -> Result<Profile, AppError> {
        let restrictions = restrictions.validated()?;
        let mut next = self.state.clone();
        next.find_mut(profile_id)?.time_restrictions = restrictions;
        self.commit(next, false)?;
        self.require(profile_id).cloned()
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<&Settings, AppError> {
        let mut next = self.state.clone();
        next.settings = settings;
        self.commit(next, true)?;
        Ok(&self.state.settings)
    }

    fn seed_default(&mut self) -> Result<(), AppError> {
        let profile = Profile::first_run_default();
        let mut next = self.state.clone();
        next.active_id = Some(profile.id.clone());
        next.profiles = vec![profile];
        self.commit(next, false)
    }

    fn require(&self, id: &str) -> Result<&Profile, AppError> {
        self.state.find(id).ok_or(AppError::NotFound { entity: "Profile" })
    }

    /// Persist `next` in one write, then swap it in.
    fn commit(&mut self, next: StoreState, with_settings: bool) -> Result<(), AppError> {
        let mut entries = vec![
            (PROFILES_KEY, serde_json::to_string(&next.profiles)?),
            (CURRENT_PROFILE_KEY, serde_json::to_string(&next.active_id)?),
        ];
        if with_settings {
            entries.push((SETTINGS_KEY, serde_json::to_string(&next.settings)?));
        }

        if let Err(e) = self.storage.set_many(&entries) {
            warn!("Keeping last known-good profile state: {e}");
            return Err(e);
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AllowedHours;

    fn store() -> (ProfileStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (ProfileStore::load(storage.clone()).unwrap(), storage)
    }

    fn defaults(store: &ProfileStore<MemoryStorage>) -> usize {
        store.profiles().iter().filter(|p| p.is_default).count()
    }

    #[test]
    fn test_first_run_seeds_default() {
        let (store, storage) = store();
        assert_eq!(store.profiles().len(), 1);
        let profile = store.active_profile().unwrap();
        assert_eq!(profile.name, "Default Profile");
        assert!(profile.is_default);
        assert!(profile.restrictions.is_blocked(Category::Gambling));
        assert!(!profile.time_restrictions.enabled);
        assert!(storage.get(PROFILES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_reload_keeps_state() {
        let (mut store, storage) = store();
        let kids = store.create_profile(NewProfile::named("Kids")).unwrap();
        store.set_active(&kids.id).unwrap();

        let reloaded = ProfileStore::load(storage).unwrap();
        assert_eq!(reloaded.profiles().len(), 2);
        assert_eq!(reloaded.active_id(), Some(kids.id.as_str()));
    }

    #[test]
    fn test_create_profile_uses_template() {
        let (mut store, _) = store();
        let kids = store.create_profile(NewProfile::named("  Kids ")).unwrap();
        assert_eq!(kids.name, "Kids");
        assert!(!kids.is_default);
        assert!(kids.restrictions.is_blocked(Category::Adult));
        assert!(kids.allowed_sites.is_empty());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let (mut store, _) = store();
        assert!(store.create_profile(NewProfile::named("   ")).is_err());

        let mut input = NewProfile::named("Kids");
        input.time_restrictions = Some(TimeRestrictions {
            enabled: true,
            allowed_hours: AllowedHours {
                start: "25:00".into(),
                end: "21:00".into(),
            },
            allowed_days: vec![1],
        });
        assert!(store.create_profile(input).is_err());
        assert_eq!(store.profiles().len(), 1);
    }

    #[test]
    fn test_at_most_one_default() {
        let (mut store, _) = store();
        let mut input = NewProfile::named("Kids");
        input.is_default = true;
        let kids = store.create_profile(input).unwrap();
        assert_eq!(defaults(&store), 1);
        assert!(store.get(&kids.id).unwrap().is_default);

        let teens = store.create_profile(NewProfile::named("Teens")).unwrap();
        let patch = ProfilePatch {
            is_default: Some(true),
            ..ProfilePatch::default()
        };
        store.update_profile(&teens.id, patch).unwrap();
        assert_eq!(defaults(&store), 1);
        assert!(store.get(&teens.id).unwrap().is_default);
    }

    #[test]
    fn test_update_unknown_profile() {
        let (mut store, _) = store();
        let err = store.update_profile("nope", ProfilePatch::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_update_merges_fields() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();
        let patch = ProfilePatch {
            name: Some("Family".into()),
            description: Some("shared laptop".into()),
            ..ProfilePatch::default()
        };
        let updated = store.update_profile(&id, patch).unwrap();
        assert_eq!(updated.name, "Family");
        assert_eq!(updated.description.as_deref(), Some("shared laptop"));
        assert!(updated.is_default);
    }

    #[test]
    fn test_delete_last_profile_rejected() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();
        let err = store.delete_profile(&id).unwrap_err();
        assert!(matches!(err, AppError::DeleteFailed { .. }));
        assert_eq!(store.profiles().len(), 1);
    }

    #[test]
    fn test_delete_active_reassigns() {
        let (mut store, storage) = store();
        let default_id = store.active_id().unwrap().to_string();
        let kids = store.create_profile(NewProfile::named("Kids")).unwrap();
        store.set_active(&kids.id).unwrap();

        store.delete_profile(&kids.id).unwrap();
        assert_eq!(store.active_id(), Some(default_id.as_str()));

        let persisted: Option<Option<String>> = load(&storage, CURRENT_PROFILE_KEY).unwrap();
        assert_eq!(persisted.flatten().as_deref(), Some(default_id.as_str()));
    }

    #[test]
    fn test_delete_unknown_profile() {
        let (mut store, _) = store();
        assert!(matches!(
            store.delete_profile("nope").unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[test]
    fn test_set_active_unknown() {
        let (mut store, _) = store();
        assert!(matches!(store.set_active("nope").unwrap_err(), AppError::NotFound { .. }));
    }

    #[test]
    fn test_add_site_validates_and_moves() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();

        let err = store.add_site(&id, "not a domain", SiteList::Blocked).unwrap_err();
        assert!(matches!(err, AppError::InvalidDomain { .. }));

        store.add_site(&id, " Example.COM ", SiteList::Blocked).unwrap();
        let profile = store.add_site(&id, "example.com", SiteList::Allowed).unwrap();
        assert_eq!(profile.allowed_sites, vec!["example.com"]);
        assert!(profile.blocked_sites.is_empty());
    }

    #[test]
    fn test_remove_absent_site_is_noop() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();
        assert!(store.remove_site(&id, "example.com", SiteList::Allowed).is_ok());
        assert!(store.remove_site("nope", "example.com", SiteList::Allowed).is_err());
    }

    #[test]
    fn test_category_restriction() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();

        let profile = store.set_category_restriction(&id, "Social", true).unwrap();
        assert!(profile.restrictions.is_blocked(Category::Social));

        let err = store.set_category_restriction(&id, "cats", true).unwrap_err();
        assert!(matches!(err, AppError::UnknownCategory { .. }));
    }

    #[test]
    fn test_time_restrictions_normalized() {
        let (mut store, _) = store();
        let id = store.active_id().unwrap().to_string();
        let restrictions = TimeRestrictions {
            enabled: true,
            allowed_hours: AllowedHours {
                start: "08:00".into(),
                end: "20:00".into(),
            },
            allowed_days: vec![5, 1, 1, 3],
        };
        let profile = store.set_time_restrictions(&id, restrictions).unwrap();
        assert_eq!(profile.time_restrictions.allowed_days, vec![1, 3, 5]);

        let mut bad = profile.time_restrictions.clone();
        bad.allowed_days = vec![0];
        assert!(store.set_time_restrictions(&id, bad).is_err());
    }

    #[test]
    fn test_storage_failure_keeps_known_good_state() {
        let (mut store, storage) = store();
        storage.set_fail_writes(true);

        let err = store.create_profile(NewProfile::named("Kids")).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(store.profiles().len(), 1);

        let id = store.active_id().unwrap().to_string();
        assert!(store.add_site(&id, "example.com", SiteList::Blocked).is_err());
        assert!(store.active_profile().unwrap().blocked_sites.is_empty());
    }

    #[test]
    fn test_dangling_active_pointer_falls_back() {
        let storage = MemoryStorage::new();
        let mut profile = Profile::new("Only");
        profile.id = "p1".into();
        storage
            .set_many(&[
                (PROFILES_KEY, serde_json::to_string(&vec![profile]).unwrap()),
                (CURRENT_PROFILE_KEY, "\"gone\"".into()),
            ])
            .unwrap();

        let store = ProfileStore::load(storage).unwrap();
        assert_eq!(store.active_id(), Some("p1"));
    }

    #[test]
    fn test_null_active_pointer_falls_back() {
        let storage = MemoryStorage::new();
        let mut profile = Profile::new("Only");
        profile.id = "p1".into();
        storage
            .set_many(&[
                (PROFILES_KEY, serde_json::to_string(&vec![profile]).unwrap()),
                (CURRENT_PROFILE_KEY, "null".into()),
            ])
            .unwrap();

        let store = ProfileStore::load(storage).unwrap();
        assert_eq!(store.active_id(), Some("p1"));
    }

    #[test]
    fn test_load_drops_unreadable_entries() {
        let storage = MemoryStorage::new();
        storage
            .set_many(&[
                (
                    PROFILES_KEY,
                    r#"[{"id":"p","name":"A","restrictions":{"other":true,"gambling":true}},
                        {"name":"no id"},
                        {"id":"p","name":"B","timeRestrictions":{"enabled":"sometimes"}}]"#
                        .into(),
                ),
                (CURRENT_PROFILE_KEY, "42".into()),
                (SETTINGS_KEY, r#"{"strictMode":"yes"}"#.into()),
            ])
            .unwrap();

        let store = ProfileStore::load(storage).unwrap();
        assert_eq!(store.profiles().len(), 1);
        let profile = store.active_profile().unwrap();
        assert_eq!(profile.id, "p");
        assert!(profile.restrictions.is_blocked(Category::Gambling));
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn test_duplicate_persisted_ids_are_separated() {
        let storage = MemoryStorage::new();
        storage
            .set_many(&[(
                PROFILES_KEY,
                r#"[{"id":"a","name":"A"},{"id":"a","name":"B"}]"#.into(),
            )])
            .unwrap();

        let mut store = ProfileStore::load(storage).unwrap();
        assert_eq!(store.active_id(), Some("a"));
        store.delete_profile("a").unwrap();
        assert_eq!(store.profiles().len(), 1);
        assert_eq!(store.active_profile().unwrap().name, "B");
    }

    #[test]
    fn test_unusable_profiles_reseed_default() {
        let storage = MemoryStorage::new();
        storage.set_many(&[(PROFILES_KEY, "{not json".into())]).unwrap();

        let store = ProfileStore::load(storage.clone()).unwrap();
        assert_eq!(store.profiles().len(), 1);
        assert!(store.active_profile().unwrap().is_default);

        let persisted: Option<Vec<Profile>> = load(&storage, PROFILES_KEY).unwrap();
        assert_eq!(persisted.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_settings_persisted() {
        let (mut store, storage) = store();
        let settings = Settings {
            strict_mode: true,
            ..Settings::default()
        };
        store.update_settings(settings).unwrap();

        let reloaded = ProfileStore::load(storage).unwrap();
        assert!(reloaded.settings().strict_mode);
    }
}
