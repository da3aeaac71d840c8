use super::CommandOutcome;
use crate::error::AppError;
use crate::models::{NewProfile, ProfilePatch};
use crate::store::{ProfileStore, Storage};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProfileCommand {
    Create { profile: NewProfile },
    Update { profile_id: String, patch: ProfilePatch },
    Delete { profile_id: String },
    SetActive { profile_id: String },
}

pub(super) fn handle<S: Storage>(
    store: &mut ProfileStore<S>,
    command: ProfileCommand,
) -> Result<CommandOutcome, AppError> {
    match command {
        ProfileCommand::Create { profile } => {
            let profile = store.create_profile(profile)?;
            Ok(CommandOutcome::Profile { profile })
        }
        ProfileCommand::Update { profile_id, patch } => {
            let profile = store.update_profile(&profile_id, patch)?;
            Ok(CommandOutcome::Profile { profile })
        }
        ProfileCommand::Delete { profile_id } => {
            store.delete_profile(&profile_id)?;
            Ok(CommandOutcome::Ok)
        }
        ProfileCommand::SetActive { profile_id } => {
            let profile = store.set_active(&profile_id)?.clone();
            Ok(CommandOutcome::Profile { profile })
        }
    }
}
