mod profiles;
mod rules;
mod settings;

pub use profiles::ProfileCommand;
pub use rules::{CategoryCommand, SiteCommand, TimeCommand};
pub use settings::SettingsCommand;

use crate::error::AppError;
use crate::models::{Profile, Settings, Snapshot};
use crate::store::{ProfileStore, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configuration request, grouped by capability. Each family is a closed
/// set of actions tagged by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Profile(ProfileCommand),
    Site(SiteCommand),
    Category(CategoryCommand),
    Time(TimeCommand),
    Settings(SettingsCommand),
}

/// Result of a successful command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandOutcome {
    Profile { profile: Profile },
    Settings { settings: Settings },
    Snapshot { snapshot: Snapshot },
    Ok,
}

impl CommandOutcome {
    /// Whether the command may have changed settings.
    pub fn touches_settings(&self) -> bool {
        matches!(self, CommandOutcome::Settings { .. })
    }
}

impl Command {
    pub fn execute<S: Storage>(
        self,
        store: &mut ProfileStore<S>,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome, AppError> {
        match self {
            Command::Profile(cmd) => profiles::handle(store, cmd),
            Command::Site(cmd) => rules::handle_site(store, cmd),
            Command::Category(cmd) => rules::handle_category(store, cmd),
            Command::Time(cmd) => rules::handle_time(store, cmd),
            Command::Settings(cmd) => settings::handle(store, cmd, now),
        }
    }
}
