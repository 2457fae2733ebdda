use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::worship_set::SetSong;
use crate::errors::WorshipError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Pending,
    Submitted,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Submitted => "submitted",
        }
    }
}

impl FromStr for SlotStatus {
    type Err = WorshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SlotStatus::Pending),
            "submitted" => Ok(SlotStatus::Submitted),
            other => Err(WorshipError::Validation(format!(
                "Unknown suggestion slot status: {}",
                other
            ))),
        }
    }
}

/// A time-boxed grant letting one user propose songs for a worship set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSlot {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub assigned_user_id: Uuid,
    pub min_songs: i32,
    pub max_songs: i32,
    pub due_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSlotDetail {
    #[serde(flatten)]
    pub slot: SuggestionSlot,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub assigned_user_id: Option<Uuid>,
    pub worship_set_id: Option<Uuid>,
}

fn default_min_songs() -> i32 {
    1
}

fn default_max_songs() -> i32 {
    3
}

fn validate_create_slot(request: &CreateSuggestionSlotRequest) -> Result<(), ValidationError> {
    if request.min_songs > request.max_songs {
        return Err(ValidationError::new("min_songs_exceeds_max_songs"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_slot"))]
pub struct CreateSuggestionSlotRequest {
    pub worship_set_id: Uuid,
    pub assigned_user_id: Uuid,
    #[serde(default = "default_min_songs")]
    #[validate(range(min = 0, max = 10))]
    pub min_songs: i32,
    #[serde(default = "default_max_songs")]
    #[validate(range(min = 1, max = 10))]
    pub max_songs: i32,
    pub due_at: DateTime<Utc>,
}

/// Partial update of a slot. Bounds are re-validated against the stored row
/// once merged, since either side may be omitted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSuggestionSlotRequest {
    pub assigned_user_id: Option<Uuid>,
    #[validate(range(min = 0, max = 10))]
    pub min_songs: Option<i32>,
    #[validate(range(min = 1, max = 10))]
    pub max_songs: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
    pub status: Option<SlotStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub song_id: Uuid,
    pub song_title: String,
    pub suggested_by: Uuid,
    pub notes: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionRequest {
    pub slot_id: Uuid,
    pub song_id: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub youtube_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApproveSuggestionRequest {
    pub song_version_id: Uuid,
    #[validate(length(min = 1, max = 8))]
    pub key_override: Option<String>,
    #[serde(default)]
    pub is_new: bool,
}

fn validate_review(request: &ReviewSuggestionRequest) -> Result<(), ValidationError> {
    if request.status == ReviewDecision::Approved && request.song_version_id.is_none() {
        return Err(ValidationError::new("song_version_id_required"));
    }
    Ok(())
}

/// Body of `PUT /suggestions/:id`, which approves or rejects by status.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_review"))]
pub struct ReviewSuggestionRequest {
    pub status: ReviewDecision,
    pub song_version_id: Option<Uuid>,
    #[validate(length(min = 1, max = 8))]
    pub key_override: Option<String>,
    #[serde(default)]
    pub is_new: bool,
}

impl ReviewSuggestionRequest {
    /// The approval payload, if this review approves.
    pub fn approval(&self) -> Option<ApproveSuggestionRequest> {
        match (self.status, self.song_version_id) {
            (ReviewDecision::Approved, Some(song_version_id)) => Some(ApproveSuggestionRequest {
                song_version_id,
                key_override: self.key_override.clone(),
                is_new: self.is_new,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReviewOutcome {
    Approved {
        #[serde(rename = "setSong")]
        set_song: SetSong,
    },
    Rejected {
        #[serde(rename = "suggestionId")]
        suggestion_id: Uuid,
    },
}
