use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{from_value, json, to_value};
use uuid::Uuid;
use validator::Validate;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::{AssignmentStatus, UpsertAssignmentsRequest},
        response::{ApiErrorBody, ApiResponse},
        service::{CreateServiceRequest, UpdateServiceRequest},
        song::CreateSongRequest,
        suggestion::{CreateSuggestionSlotRequest, ReviewDecision, ReviewSuggestionRequest},
        user::Role,
        worship_set::{SetStatus, UpdateWorshipSetRequest},
    },
};

#[test]
fn test_service_request_rejects_invalid_uuid() {
    let body = json!({
        "serviceTypeId": "not-a-valid-uuid",
        "date": "2026-11-01T10:00:00Z"
    });

    let parsed: Result<CreateServiceRequest, _> = from_value(body);

    assert!(parsed.is_err());
}

#[test]
fn test_service_request_uses_camel_case() {
    let service_type_id = Uuid::new_v4();
    let body = json!({
        "serviceTypeId": service_type_id,
        "date": "2026-11-01T10:00:00Z",
        "title": "Sunday Morning"
    });

    let parsed: CreateServiceRequest = from_value(body).expect("valid request");

    assert_eq!(parsed.service_type_id, service_type_id);
    assert_eq!(
        parsed.date,
        Utc.with_ymd_and_hms(2026, 11, 1, 10, 0, 0).unwrap()
    );
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_slot_request_defaults_and_bounds() {
    let body = json!({
        "worshipSetId": Uuid::new_v4(),
        "assignedUserId": Uuid::new_v4(),
        "dueAt": "2026-11-01T10:00:00Z"
    });
    let parsed: CreateSuggestionSlotRequest = from_value(body).expect("valid request");

    assert_eq!(parsed.min_songs, 1);
    assert_eq!(parsed.max_songs, 3);
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_slot_request_min_above_max_is_invalid() {
    let body = json!({
        "worshipSetId": Uuid::new_v4(),
        "assignedUserId": Uuid::new_v4(),
        "minSongs": 3,
        "maxSongs": 2,
        "dueAt": "2026-11-01T10:00:00Z"
    });
    let parsed: CreateSuggestionSlotRequest = from_value(body).expect("well-formed request");

    let error: WorshipError = parsed.validate().unwrap_err().into();

    assert!(matches!(error, WorshipError::Validation(_)));
}

#[test]
fn test_slot_request_rejects_non_timestamp_due_at() {
    let body = json!({
        "worshipSetId": Uuid::new_v4(),
        "assignedUserId": Uuid::new_v4(),
        "dueAt": "next sunday"
    });

    assert!(from_value::<CreateSuggestionSlotRequest>(body).is_err());
}

#[test]
fn test_song_request_requires_title() {
    let request = CreateSongRequest {
        title: String::new(),
        artist: None,
        ccli_number: None,
        default_key: Some("G".to_string()),
        tempo: Some(72),
        notes: None,
    };

    assert!(request.validate().is_err());
}

#[test]
fn test_review_approval_requires_version() {
    let missing_version = ReviewSuggestionRequest {
        status: ReviewDecision::Approved,
        song_version_id: None,
        key_override: None,
        is_new: false,
    };
    assert!(missing_version.validate().is_err());
    assert!(missing_version.approval().is_none());

    let version = Uuid::new_v4();
    let approve = ReviewSuggestionRequest {
        song_version_id: Some(version),
        ..missing_version.clone()
    };
    assert!(approve.validate().is_ok());
    assert_eq!(approve.approval().unwrap().song_version_id, version);

    let reject = ReviewSuggestionRequest {
        status: ReviewDecision::Rejected,
        ..missing_version
    };
    assert!(reject.validate().is_ok());
    assert!(reject.approval().is_none());
}

#[test]
fn test_upsert_assignments_parses_clearing_values() {
    let keys = Uuid::new_v4();
    let drums = Uuid::new_v4();
    let bass = Uuid::new_v4();
    let user = Uuid::new_v4();
    let body = json!({
        "assignments": {
            keys.to_string(): user.to_string(),
            drums.to_string(): "",
            bass.to_string(): null
        }
    });

    let parsed: UpsertAssignmentsRequest = from_value(body).expect("valid request");
    assert!(parsed.validate().is_ok());

    let mut desired = parsed.desired().unwrap();
    desired.sort_by_key(|(instrument, _)| *instrument);
    let mut expected = vec![(keys, Some(user)), (drums, None), (bass, None)];
    expected.sort_by_key(|(instrument, _)| *instrument);

    assert_eq!(desired, expected);
}

#[test]
fn test_upsert_assignments_rejects_bad_user_id() {
    let body = json!({
        "assignments": { Uuid::new_v4().to_string(): "bob" }
    });

    let parsed: UpsertAssignmentsRequest = from_value(body).expect("well-formed request");

    assert!(parsed.validate().is_err());
    assert!(parsed.desired().is_err());
}

#[rstest]
#[case(AssignmentStatus::Invited, AssignmentStatus::Accepted, true)]
#[case(AssignmentStatus::Invited, AssignmentStatus::Declined, true)]
#[case(AssignmentStatus::Invited, AssignmentStatus::Withdrawn, false)]
#[case(AssignmentStatus::Accepted, AssignmentStatus::Declined, false)]
#[case(AssignmentStatus::Declined, AssignmentStatus::Accepted, false)]
#[case(AssignmentStatus::Withdrawn, AssignmentStatus::Accepted, false)]
fn test_assignment_replies(
    #[case] from: AssignmentStatus,
    #[case] to: AssignmentStatus,
    #[case] allowed: bool,
) {
    let result = from.respond(to);

    assert_eq!(result.is_ok(), allowed);
    if !allowed {
        assert!(matches!(result, Err(WorshipError::Authorization(_))));
    }
}

#[rstest]
#[case("admin", Role::Admin)]
#[case("leader", Role::Leader)]
#[case("musician", Role::Musician)]
fn test_role_round_trips_through_str(#[case] raw: &str, #[case] role: Role) {
    assert_eq!(raw.parse::<Role>().unwrap(), role);
    assert_eq!(role.as_str(), raw);
    assert_eq!(to_value(role).unwrap(), json!(raw));
}

#[test]
fn test_unknown_status_is_validation_error() {
    assert!(matches!(
        "archived".parse::<SetStatus>(),
        Err(WorshipError::Validation(_))
    ));
}

#[test]
fn test_envelopes() {
    let data = to_value(ApiResponse::new(vec![1, 2, 3])).unwrap();
    assert_eq!(data, json!({ "data": [1, 2, 3] }));

    let error = to_value(ApiErrorBody::new("Song not found")).unwrap();
    assert_eq!(error, json!({ "error": { "message": "Song not found" } }));
}

#[test]
fn test_update_distinguishes_null_from_missing() {
    let leader = Uuid::new_v4();

    let untouched: UpdateWorshipSetRequest = from_value(json!({"status": "published"})).unwrap();
    assert_eq!(untouched.leader_user_id, None);
    assert_eq!(untouched.notes, None);

    let cleared: UpdateWorshipSetRequest =
        from_value(json!({"leaderUserId": null, "notes": null})).unwrap();
    assert_eq!(cleared.leader_user_id, Some(None));
    assert_eq!(cleared.notes, Some(None));

    let set: UpdateServiceRequest =
        from_value(json!({"leaderUserId": leader, "notes": "Communion"})).unwrap();
    assert_eq!(set.leader_user_id, Some(Some(leader)));
    assert_eq!(set.notes, Some(Some("Communion".to_string())));
    assert!(set.validate().is_ok());
}

#[test]
fn test_update_notes_length_still_validated() {
    let request: UpdateServiceRequest = from_value(json!({"notes": "x".repeat(2001)})).unwrap();

    assert!(request.validate().is_err());
}
