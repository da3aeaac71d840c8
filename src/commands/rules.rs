use super::CommandOutcome;
use crate::error::AppError;
use crate::models::{SiteList, TimeRestrictions};
use crate::store::{ProfileStore, Storage};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SiteCommand {
    Add { profile_id: String, domain: String, list: SiteList },
    Remove { profile_id: String, domain: String, list: SiteList },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CategoryCommand {
    /// `category` is a tag string; unknown tags are rejected by the store.
    SetRestriction { profile_id: String, category: String, blocked: bool },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TimeCommand {
    Set { profile_id: String, restrictions: TimeRestrictions },
}

pub(super) fn handle_site<S: Storage>(
    store: &mut ProfileStore<S>,
    command: SiteCommand,
) -> Result<CommandOutcome, AppError> {
    let profile = match command {
        SiteCommand::Add { profile_id, domain, list } => store.add_site(&profile_id, &domain, list)?,
        SiteCommand::Remove { profile_id, domain, list } => store.remove_site(&profile_id, &domain, list)?,
    };
    Ok(CommandOutcome::Profile { profile })
}

pub(super) fn handle_category<S: Storage>(
    store: &mut ProfileStore<S>,
    command: CategoryCommand,
) -> Result<CommandOutcome, AppError> {
    let CategoryCommand::SetRestriction { profile_id, category, blocked } = command;
    let profile = store.set_category_restriction(&profile_id, &category, blocked)?;
    Ok(CommandOutcome::Profile { profile })
}

pub(super) fn handle_time<S: Storage>(
    store: &mut ProfileStore<S>,
    command: TimeCommand,
) -> Result<CommandOutcome, AppError> {
    let TimeCommand::Set { profile_id, restrictions } = command;
    let profile = store.set_time_restrictions(&profile_id, restrictions)?;
    Ok(CommandOutcome::Profile { profile })
}
