use crate::commands::{
    CategoryCommand, Command, CommandOutcome, ProfileCommand, SettingsCommand, SiteCommand, TimeCommand,
};
use crate::engine::{NavigationOutcome, PolicyEngine, SiteStatus};
use crate::error::{AppError, ErrorKind};
use crate::models::{ActivityRecord, DailyStats, Profile, Settings, Snapshot, Statistics};
use crate::store::Storage;
use chrono::{DateTime, Local, TimeZone, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Chrome limits native messaging to 1MB (1024 * 1024 bytes)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IncomingMessage {
    Navigate {
        url: String,
    },
    CheckSiteStatus {
        domain: String,
    },
    GetCurrentProfile,
    ListProfiles,
    GetStatistics,
    GetDailyStats {
        #[serde(default)]
        profile_id: Option<String>,
        days: u32,
    },
    GetActivity {
        #[serde(default)]
        profile_id: Option<String>,
        #[serde(default = "default_activity_limit")]
        limit: usize,
        #[serde(default)]
        offset: usize,
    },
    ClearActivity,
    GetSettings,
    Profile(ProfileCommand),
    Site(SiteCommand),
    Category(CategoryCommand),
    Time(TimeCommand),
    Settings(SettingsCommand),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutgoingMessage {
    Decision(NavigationOutcome),
    /// The url was not an http(s) page and was not evaluated.
    Skipped { url: String },
    SiteStatus(SiteStatus),
    Profile { profile: Option<Profile> },
    Profiles {
        profiles: Vec<Profile>,
        active_profile_id: Option<String>,
    },
    Statistics(Statistics),
    DailyStats { days: Vec<DailyStats> },
    Activity { records: Vec<ActivityRecord> },
    Settings { settings: Settings },
    Snapshot { snapshot: Snapshot },
    Ok,
    Error { kind: ErrorKind, message: String },
}

impl From<&AppError> for OutgoingMessage {
    fn from(e: &AppError) -> Self {
        OutgoingMessage::Error {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<CommandOutcome> for OutgoingMessage {
    fn from(outcome: CommandOutcome) -> Self {
        match outcome {
            CommandOutcome::Profile { profile } => OutgoingMessage::Profile { profile: Some(profile) },
            CommandOutcome::Settings { settings } => OutgoingMessage::Settings { settings },
            CommandOutcome::Snapshot { snapshot } => OutgoingMessage::Snapshot { snapshot },
            CommandOutcome::Ok => OutgoingMessage::Ok,
        }
    }
}

/// Read one length-prefixed frame. Chrome Native Messaging uses a
/// little-endian u32 length followed by that many bytes of UTF-8 JSON.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub fn write_message<W: Write>(writer: &mut W, message: &OutgoingMessage) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, "Outgoing message exceeds u32 length")
    })?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}

pub struct NativeHost<S: Storage + Clone> {
    engine: Arc<PolicyEngine<S>>,
}

impl<S: Storage + Clone> NativeHost<S> {
    pub fn new(engine: Arc<PolicyEngine<S>>) -> Self {
        Self { engine }
    }

    /// Serve frames until the reader is closed. A frame that is not a valid
    /// message is answered with an error and the loop continues.
    pub fn run<R: Read, W: Write>(&self, reader: &mut R, writer: &mut W) -> io::Result<()> {
        loop {
            let frame = read_frame(reader)?;
            let response = match serde_json::from_slice::<IncomingMessage>(&frame) {
                Ok(message) => self.handle_message(message, Local::now()),
                Err(e) => {
                    warn!("Rejecting malformed message: {e}");
                    OutgoingMessage::from(&AppError::Json(e))
                }
            };
            write_message(writer, &response)?;
        }
    }

    pub fn handle_message<Tz: TimeZone>(&self, message: IncomingMessage, now: DateTime<Tz>) -> OutgoingMessage {
        let engine = &self.engine;
        let result: Result<OutgoingMessage, AppError> = match message {
            IncomingMessage::Navigate { url } => Ok(match engine.handle_navigation(&url, now) {
                Some(outcome) => OutgoingMessage::Decision(outcome),
                None => OutgoingMessage::Skipped { url },
            }),
            IncomingMessage::CheckSiteStatus { domain } => {
                engine.check_site_status(&domain, now).map(OutgoingMessage::SiteStatus)
            }
            IncomingMessage::GetCurrentProfile => Ok(OutgoingMessage::Profile {
                profile: engine.active_profile(),
            }),
            IncomingMessage::ListProfiles => Ok(OutgoingMessage::Profiles {
                active_profile_id: engine.active_profile().map(|p| p.id),
                profiles: engine.profiles(),
            }),
            IncomingMessage::GetStatistics => Ok(OutgoingMessage::Statistics(engine.statistics_today(now))),
            IncomingMessage::GetDailyStats { profile_id, days } => engine
                .daily_stats(profile_id.as_deref(), days, now)
                .map(|days| OutgoingMessage::DailyStats { days }),
            IncomingMessage::GetActivity {
                profile_id,
                limit,
                offset,
            } => engine
                .recent_activity(profile_id.as_deref(), limit, offset)
                .map(|records| OutgoingMessage::Activity { records }),
            IncomingMessage::ClearActivity => engine.clear_activity().map(|()| OutgoingMessage::Ok),
            IncomingMessage::GetSettings => Ok(OutgoingMessage::Settings {
                settings: engine.settings(),
            }),
            IncomingMessage::Profile(cmd) => self.execute(Command::Profile(cmd), &now),
            IncomingMessage::Site(cmd) => self.execute(Command::Site(cmd), &now),
            IncomingMessage::Category(cmd) => self.execute(Command::Category(cmd), &now),
            IncomingMessage::Time(cmd) => self.execute(Command::Time(cmd), &now),
            IncomingMessage::Settings(cmd) => self.execute(Command::Settings(cmd), &now),
        };

        result.unwrap_or_else(|e| {
            debug!("Request failed: {e}");
            OutgoingMessage::from(&e)
        })
    }

    fn execute<Tz: TimeZone>(&self, command: Command, now: &DateTime<Tz>) -> Result<OutgoingMessage, AppError> {
        self.engine
            .execute(command, now.with_timezone(&Utc))
            .map(OutgoingMessage::from)
    }
}
