use super::CommandOutcome;
use crate::error::AppError;
use crate::models::Settings;
use crate::store::{ProfileStore, Storage};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SettingsCommand {
    Update { settings: Settings },
    Export,
    /// `data` is a previously exported snapshot document.
    Import { data: serde_json::Value },
    Reset,
}

pub(super) fn handle<S: Storage>(
    store: &mut ProfileStore<S>,
    command: SettingsCommand,
    now: DateTime<Utc>,
) -> Result<CommandOutcome, AppError> {
    match command {
        SettingsCommand::Update { settings } => {
            let settings = store.update_settings(settings)?.clone();
            Ok(CommandOutcome::Settings { settings })
        }
        SettingsCommand::Export => Ok(CommandOutcome::Snapshot {
            snapshot: store.export_snapshot(now),
        }),
        SettingsCommand::Import { data } => {
            store.import_snapshot(&data.to_string())?;
            Ok(CommandOutcome::Settings {
                settings: store.settings().clone(),
            })
        }
        SettingsCommand::Reset => {
            store.reset()?;
            Ok(CommandOutcome::Settings {
                settings: store.settings().clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn test_update_settings() {
        let mut store = ProfileStore::load(MemoryStorage::new()).unwrap();
        let command: SettingsCommand = serde_json::from_value(serde_json::json!({
            "action": "update",
            "settings": {"apiEndpoint": "", "strictMode": true}
        }))
        .unwrap();

        let outcome = handle(&mut store, command, Utc::now()).unwrap();
        assert!(outcome.touches_settings());
        assert!(store.settings().strict_mode);
        assert!(store.settings().api_endpoint.is_empty());
    }

    #[test]
    fn test_export_import_reset() {
        let mut store = ProfileStore::load(MemoryStorage::new()).unwrap();
        let CommandOutcome::Snapshot { snapshot } = handle(&mut store, SettingsCommand::Export, Utc::now()).unwrap()
        else {
            panic!("expected a snapshot");
        };

        let mut other = ProfileStore::load(MemoryStorage::new()).unwrap();
        let import = SettingsCommand::Import {
            data: serde_json::to_value(&snapshot).unwrap(),
        };
        handle(&mut other, import, Utc::now()).unwrap();
        assert_eq!(other.active_id(), store.active_id());

        handle(&mut other, SettingsCommand::Reset, Utc::now()).unwrap();
        assert_ne!(other.active_id(), store.active_id());
    }
}
