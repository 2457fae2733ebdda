use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::suggestion::SuggestionSlot;
use crate::errors::WorshipError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetStatus {
    #[default]
    Draft,
    Published,
}

impl SetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetStatus::Draft => "draft",
            SetStatus::Published => "published",
        }
    }
}

impl FromStr for SetStatus {
    type Err = WorshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SetStatus::Draft),
            "published" => Ok(SetStatus::Published),
            other => Err(WorshipError::Validation(format!(
                "Unknown worship set status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipSet {
    pub id: Uuid,
    pub service_id: Uuid,
    pub status: SetStatus,
    pub leader_user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A song confirmed into a worship set's lineup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSong {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub song_version_id: Uuid,
    pub song_id: Uuid,
    pub title: String,
    pub position: i32,
    pub key_override: Option<String>,
    /// Effective key after override resolution
    pub key: Option<String>,
    pub is_new: bool,
    pub youtube_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipSetDetail {
    #[serde(flatten)]
    pub worship_set: WorshipSet,
    pub songs: Vec<SetSong>,
    pub suggestion_slots: Vec<SuggestionSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipSetQuery {
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorshipSetRequest {
    pub service_id: Uuid,
    pub leader_user_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorshipSetRequest {
    pub status: Option<SetStatus>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub leader_user_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddSetSongRequest {
    pub song_version_id: Uuid,
    #[validate(length(min = 1, max = 8))]
    pub key_override: Option<String>,
    #[serde(default)]
    pub is_new: bool,
    #[validate(url)]
    pub youtube_url: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
