use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::Assignment,
        instrument::Instrument,
        notification::Notification,
        service::{Service, ServiceType},
        song::{Song, SongVersion},
        suggestion::{Suggestion, SuggestionSlot},
        user::{Role, User},
        worship_set::{SetSong, WorshipSet},
    },
    workflow::resolve_key,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = WorshipError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|role| role.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            roles,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSong {
    pub id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    pub ccli_number: Option<String>,
    pub default_key: Option<String>,
    pub tempo: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbSong> for Song {
    fn from(row: DbSong) -> Self {
        Song {
            id: row.id,
            title: row.title,
            artist: row.artist,
            ccli_number: row.ccli_number,
            default_key: row.default_key,
            tempo: row.tempo,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSongVersion {
    pub id: Uuid,
    pub song_id: Uuid,
    pub name: String,
    pub key: Option<String>,
    pub youtube_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSongVersion> for SongVersion {
    fn from(row: DbSongVersion) -> Self {
        SongVersion {
            id: row.id,
            song_id: row.song_id,
            name: row.name,
            key: row.key,
            youtube_url: row.youtube_url,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbServiceType {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbServiceType> for ServiceType {
    fn from(row: DbServiceType) -> Self {
        ServiceType {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbService {
    pub id: Uuid,
    pub service_type_id: Uuid,
    pub date: DateTime<Utc>,
    pub title: Option<String>,
    pub leader_user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbService> for Service {
    fn from(row: DbService) -> Self {
        Service {
            id: row.id,
            service_type_id: row.service_type_id,
            date: row.date,
            title: row.title,
            leader_user_id: row.leader_user_id,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWorshipSet {
    pub id: Uuid,
    pub service_id: Uuid,
    pub status: String,
    pub leader_user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbWorshipSet> for WorshipSet {
    type Error = WorshipError;

    fn try_from(row: DbWorshipSet) -> Result<Self, Self::Error> {
        Ok(WorshipSet {
            id: row.id,
            service_id: row.service_id,
            status: row.status.parse()?,
            leader_user_id: row.leader_user_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A set song joined with its version and song, for key resolution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSetSong {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub song_version_id: Uuid,
    pub song_id: Uuid,
    pub title: String,
    pub position: i32,
    pub key_override: Option<String>,
    pub version_key: Option<String>,
    pub default_key: Option<String>,
    pub is_new: bool,
    pub youtube_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSetSong> for SetSong {
    fn from(row: DbSetSong) -> Self {
        let key = resolve_key(
            row.key_override.as_deref(),
            row.version_key.as_deref(),
            row.default_key.as_deref(),
        )
        .map(str::to_string);

        SetSong {
            id: row.id,
            worship_set_id: row.worship_set_id,
            song_version_id: row.song_version_id,
            song_id: row.song_id,
            title: row.title,
            position: row.position,
            key_override: row.key_override,
            key,
            is_new: row.is_new,
            youtube_url: row.youtube_url,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSuggestionSlot {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub assigned_user_id: Uuid,
    pub min_songs: i32,
    pub max_songs: i32,
    pub due_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbSuggestionSlot> for SuggestionSlot {
    type Error = WorshipError;

    fn try_from(row: DbSuggestionSlot) -> Result<Self, Self::Error> {
        Ok(SuggestionSlot {
            id: row.id,
            worship_set_id: row.worship_set_id,
            assigned_user_id: row.assigned_user_id,
            min_songs: row.min_songs,
            max_songs: row.max_songs,
            due_at: row.due_at,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

/// A suggestion joined with its song's title.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSuggestion {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub song_id: Uuid,
    pub song_title: String,
    pub suggested_by: Uuid,
    pub notes: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSuggestion> for Suggestion {
    fn from(row: DbSuggestion) -> Self {
        Suggestion {
            id: row.id,
            slot_id: row.slot_id,
            song_id: row.song_id,
            song_title: row.song_title,
            suggested_by: row.suggested_by,
            notes: row.notes,
            youtube_url: row.youtube_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbInstrument {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DbInstrument> for Instrument {
    fn from(row: DbInstrument) -> Self {
        Instrument {
            id: row.id,
            code: row.code,
            name: row.name,
            display_order: row.display_order,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAssignment {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub instrument_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbAssignment> for Assignment {
    type Error = WorshipError;

    fn try_from(row: DbAssignment) -> Result<Self, Self::Error> {
        Ok(Assignment {
            id: row.id,
            worship_set_id: row.worship_set_id,
            instrument_id: row.instrument_id,
            user_id: row.user_id,
            status: row.status.parse()?,
            invited_at: row.invited_at,
            responded_at: row.responded_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbNotification> for Notification {
    fn from(row: DbNotification) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            title: row.title,
            body: row.body,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// Converts a batch of rows whose conversion can fail on stored enum text.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, WorshipError>
where
    T: TryFrom<R, Error = WorshipError>,
{
    rows.into_iter().map(T::try_from).collect()
}
