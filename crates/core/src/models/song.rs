use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
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

/// A concrete arrangement of a song: its own key and reference recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongVersion {
    pub id: Uuid,
    pub song_id: Uuid,
    pub name: String,
    pub key: Option<String>,
    pub youtube_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetail {
    #[serde(flatten)]
    pub song: Song,
    pub versions: Vec<SongVersion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SongQuery {
    /// Case-insensitive substring matched against title and artist
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSongRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    pub artist: Option<String>,
    #[validate(length(max = 32))]
    pub ccli_number: Option<String>,
    #[validate(length(min = 1, max = 8))]
    pub default_key: Option<String>,
    #[validate(range(min = 20, max = 300))]
    pub tempo: Option<i32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSongRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200))]
    pub artist: Option<String>,
    #[validate(length(max = 32))]
    pub ccli_number: Option<String>,
    #[validate(length(min = 1, max = 8))]
    pub default_key: Option<String>,
    #[validate(range(min = 20, max = 300))]
    pub tempo: Option<i32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSongVersionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 8))]
    pub key: Option<String>,
    #[validate(url)]
    pub youtube_url: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
