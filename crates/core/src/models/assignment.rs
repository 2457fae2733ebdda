use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::{WorshipError, WorshipResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Invited,
    Accepted,
    Declined,
    Withdrawn,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Invited => "invited",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Declined => "declined",
            AssignmentStatus::Withdrawn => "withdrawn",
        }
    }

    /// Applies a musician's reply to an invitation.
    ///
    /// Only `invited → accepted` and `invited → declined` are replies; every
    /// other transition is refused with an authorization error.
    pub fn respond(self, reply: AssignmentStatus) -> WorshipResult<AssignmentStatus> {
        match (self, reply) {
            (AssignmentStatus::Invited, AssignmentStatus::Accepted)
            | (AssignmentStatus::Invited, AssignmentStatus::Declined) => Ok(reply),
            (from, to) => Err(WorshipError::Authorization(format!(
                "Cannot change assignment from {} to {}",
                from.as_str(),
                to.as_str()
            ))),
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = WorshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invited" => Ok(AssignmentStatus::Invited),
            "accepted" => Ok(AssignmentStatus::Accepted),
            "declined" => Ok(AssignmentStatus::Declined),
            "withdrawn" => Ok(AssignmentStatus::Withdrawn),
            other => Err(WorshipError::Validation(format!(
                "Unknown assignment status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub worship_set_id: Uuid,
    pub instrument_id: Uuid,
    pub user_id: Uuid,
    pub status: AssignmentStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub worship_set_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub worship_set_id: Uuid,
    pub instrument_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondToAssignmentRequest {
    pub status: AssignmentStatus,
}

fn validate_assignment_values(
    request: &UpsertAssignmentsRequest,
) -> Result<(), ValidationError> {
    let all_valid = request
        .assignments
        .values()
        .flatten()
        .all(|value| value.is_empty() || Uuid::parse_str(value).is_ok());
    if all_valid {
        Ok(())
    } else {
        Err(ValidationError::new("assignment_user_id_must_be_uuid"))
    }
}

/// Bulk replacement of a worship set's instrument assignments.
///
/// Maps instrument id to the user who should play it. `null` or an empty
/// string clears the instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_assignment_values"))]
pub struct UpsertAssignmentsRequest {
    pub assignments: HashMap<Uuid, Option<String>>,
}

impl UpsertAssignmentsRequest {
    /// Desired user per instrument, ordered by instrument id.
    pub fn desired(&self) -> WorshipResult<Vec<(Uuid, Option<Uuid>)>> {
        let mut desired = self
            .assignments
            .iter()
            .map(|(instrument_id, value)| {
                let user_id = match value.as_deref() {
                    None | Some("") => None,
                    Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                        WorshipError::Validation(format!(
                            "Invalid user id for instrument {}: {}",
                            instrument_id, raw
                        ))
                    })?),
                };
                Ok((*instrument_id, user_id))
            })
            .collect::<WorshipResult<Vec<_>>>()?;
        desired.sort_by_key(|(instrument_id, _)| *instrument_id);
        Ok(desired)
    }
}
