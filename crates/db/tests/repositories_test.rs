//! Repository tests against a live Postgres.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -p worship-db -- --ignored`.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::{AssignmentStatus, CreateAssignmentRequest},
        instrument::CreateInstrumentRequest,
        service::{CreateServiceRequest, UpdateServiceRequest},
        song::{CreateSongRequest, CreateSongVersionRequest},
        suggestion::{ApproveSuggestionRequest, CreateSuggestionRequest, SlotStatus},
        user::Role,
        worship_set::UpdateWorshipSetRequest,
    },
};
use worship_db::{
    DbPool, create_pool,
    repositories::{
        assignments, instruments, service_types, services, songs,
        suggestion_slots::{self, SlotChanges},
        suggestions, users,
        worship_sets::{self, NewSetSong},
    },
    schema::initialize_database,
};

async fn test_pool() -> DbPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = create_pool(&url).await.expect("connect to test database");
    initialize_database(&pool)
        .await
        .expect("initialize test schema");
    pool
}

async fn seed_user(pool: &DbPool, roles: &[Role]) -> Uuid {
    let email = format!("{}@example.com", Uuid::new_v4());
    users::create_user(pool, &email, "Test User", None, roles)
        .await
        .expect("create user")
        .id
}

/// A service with no worship set yet; returns the service id.
async fn seed_service(pool: &DbPool) -> Uuid {
    let service_type = service_types::create_service_type(pool, &format!("Type {}", Uuid::new_v4()))
        .await
        .expect("create service type");
    services::create_service(
        pool,
        &CreateServiceRequest {
            service_type_id: service_type.id,
            date: Utc::now() + Duration::days(7),
            title: Some("Sunday Morning".to_string()),
            leader_user_id: None,
            notes: None,
        },
    )
    .await
    .expect("create service")
    .id
}

/// A service with an empty draft worship set; returns the set id.
async fn seed_worship_set(pool: &DbPool) -> Uuid {
    let service_id = seed_service(pool).await;

    worship_sets::create_worship_set(pool, service_id, None, None)
        .await
        .expect("create worship set")
        .id
}

async fn seed_instrument(pool: &DbPool, name: &str) -> Uuid {
    instruments::create_instrument(
        pool,
        &CreateInstrumentRequest {
            code: format!("{}-{}", name.to_lowercase(), &Uuid::new_v4().simple().to_string()[..8]),
            name: name.to_string(),
            display_order: 0,
        },
    )
    .await
    .expect("create instrument")
    .id
}

/// Returns `(song_id, version_id)`.
async fn seed_song(pool: &DbPool, title: &str) -> (Uuid, Uuid) {
    let song = songs::create_song(
        pool,
        &CreateSongRequest {
            title: title.to_string(),
            artist: None,
            ccli_number: None,
            default_key: Some("G".to_string()),
            tempo: Some(72),
            notes: None,
        },
    )
    .await
    .expect("create song");
    let version = songs::create_version(
        pool,
        song.id,
        &CreateSongVersionRequest {
            name: "Original".to_string(),
            key: None,
            youtube_url: None,
            notes: None,
        },
    )
    .await
    .expect("create version");

    (song.id, version.id)
}

fn suggestion(slot_id: Uuid, song_id: Uuid) -> CreateSuggestionRequest {
    CreateSuggestionRequest {
        slot_id,
        song_id,
        notes: None,
        youtube_url: None,
    }
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn slot_rejects_suggestion_beyond_max_songs() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, _) = seed_song(&pool, "Capacity").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, musician, 1, 2, Utc::now())
        .await
        .unwrap();

    for _ in 0..2 {
        suggestions::create_suggestion(&pool, musician, &suggestion(slot.id, song_id))
            .await
            .unwrap();
    }
    let third = suggestions::create_suggestion(&pool, musician, &suggestion(slot.id, song_id)).await;

    assert!(matches!(third, Err(WorshipError::Capacity(_))));
    assert_eq!(suggestions::list_by_slot(&pool, slot.id).await.unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn concurrent_submissions_never_overshoot() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, _) = seed_song(&pool, "Race").await;

    let slot_id = suggestion_slots::create_slot(&pool, set_id, musician, 0, 2, Utc::now())
        .await
        .unwrap()
        .id;

    let attempts = (0..5).map(|_| {
        let pool = pool.clone();
        tokio::spawn(async move {
            suggestions::create_suggestion(&pool, musician, &suggestion(slot_id, song_id)).await
        })
    });
    let mut accepted = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        if attempt.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 2);
    assert_eq!(suggestions::list_by_slot(&pool, slot_id).await.unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn submitting_slot_needs_min_songs() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, _) = seed_song(&pool, "Submit").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, musician, 1, 3, Utc::now())
        .await
        .unwrap();

    let early = suggestion_slots::submit_slot(&pool, slot.id).await;
    assert!(matches!(early, Err(WorshipError::Validation(_))));

    suggestions::create_suggestion(&pool, musician, &suggestion(slot.id, song_id))
        .await
        .unwrap();
    let submitted = suggestion_slots::submit_slot(&pool, slot.id).await.unwrap();
    assert_eq!(submitted.status, "submitted");
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn approval_moves_suggestion_into_set() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, version_id) = seed_song(&pool, "Approve").await;
    let (_, other_version) = seed_song(&pool, "Other").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, musician, 1, 3, Utc::now())
        .await
        .unwrap();
    let mut request = suggestion(slot.id, song_id);
    request.notes = Some("Key of A works better".to_string());
    let pending = suggestions::create_suggestion(&pool, musician, &request)
        .await
        .unwrap();

    let mismatched = suggestions::approve_suggestion(
        &pool,
        pending.id,
        &ApproveSuggestionRequest {
            song_version_id: other_version,
            key_override: None,
            is_new: false,
        },
    )
    .await;
    assert!(matches!(mismatched, Err(WorshipError::Validation(_))));

    let set_song = suggestions::approve_suggestion(
        &pool,
        pending.id,
        &ApproveSuggestionRequest {
            song_version_id: version_id,
            key_override: Some("A".to_string()),
            is_new: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(set_song.position, 1);
    assert_eq!(set_song.notes.as_deref(), Some("Key of A works better"));
    assert!(
        suggestions::get_suggestion_by_id(&pool, pending.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn set_holds_six_songs_and_one_new() {
    let pool = test_pool().await;
    let set_id = seed_worship_set(&pool).await;
    let (_, version_id) = seed_song(&pool, "Ceiling").await;

    let song = |is_new| NewSetSong {
        song_version_id: version_id,
        is_new,
        ..NewSetSong::default()
    };

    worship_sets::add_set_song(&pool, set_id, &song(true)).await.unwrap();
    let second_new = worship_sets::add_set_song(&pool, set_id, &song(true)).await;
    assert!(matches!(second_new, Err(WorshipError::Capacity(_))));

    for _ in 0..5 {
        worship_sets::add_set_song(&pool, set_id, &song(false)).await.unwrap();
    }
    let seventh = worship_sets::add_set_song(&pool, set_id, &song(false)).await;
    assert!(matches!(seventh, Err(WorshipError::Capacity(_))));

    let positions: Vec<i32> = worship_sets::list_set_songs(&pool, set_id)
        .await
        .unwrap()
        .iter()
        .map(|song| song.position)
        .collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn deleting_worship_set_leaves_no_orphans() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, version_id) = seed_song(&pool, "Cascade").await;
    let acoustic = seed_instrument(&pool, "AG").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, musician, 1, 3, Utc::now())
        .await
        .unwrap();
    suggestions::create_suggestion(&pool, musician, &suggestion(slot.id, song_id))
        .await
        .unwrap();
    worship_sets::add_set_song(
        &pool,
        set_id,
        &NewSetSong {
            song_version_id: version_id,
            ..NewSetSong::default()
        },
    )
    .await
    .unwrap();
    assignments::create_assignment(
        &pool,
        &CreateAssignmentRequest {
            worship_set_id: set_id,
            instrument_id: acoustic,
            user_id: musician,
        },
    )
    .await
    .unwrap();

    assert!(worship_sets::delete_worship_set(&pool, set_id).await.unwrap());

    assert!(suggestion_slots::get_slot_by_id(&pool, slot.id).await.unwrap().is_none());
    assert!(suggestions::list_by_slot(&pool, slot.id).await.unwrap().is_empty());
    assert!(worship_sets::list_set_songs(&pool, set_id).await.unwrap().is_empty());
    assert!(
        assignments::list_assignments(&pool, Some(set_id))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(!worship_sets::delete_worship_set(&pool, set_id).await.unwrap());
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn bulk_assignment_diff_keeps_unchanged_rows() {
    let pool = test_pool().await;
    let alice = seed_user(&pool, &[Role::Musician]).await;
    let bob = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;

    let keys = seed_instrument(&pool, "Keys").await;
    let drums = seed_instrument(&pool, "Drums").await;

    let first = assignments::replace_for_set(&pool, set_id, &[(keys, Some(alice)), (drums, Some(bob))])
        .await
        .unwrap();
    assert_eq!(first.invited.len(), 2);

    let second = assignments::replace_for_set(&pool, set_id, &[(keys, Some(alice)), (drums, None)])
        .await
        .unwrap();
    assert!(second.invited.is_empty());
    assert_eq!(second.assignments.len(), 1);
    assert_eq!(second.assignments[0].user_id, alice);

    let third = assignments::replace_for_set(&pool, set_id, &[(keys, Some(bob))])
        .await
        .unwrap();
    assert_eq!(third.invited.len(), 1);
    assert_eq!(third.invited[0].user_id, bob);
    assert_eq!(third.invited[0].status, "invited");
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn reassigning_slot_keeps_its_suggestions() {
    let pool = test_pool().await;
    let alice = seed_user(&pool, &[Role::Musician]).await;
    let bob = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, _) = seed_song(&pool, "Reassign").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, alice, 1, 3, Utc::now())
        .await
        .unwrap();
    for _ in 0..2 {
        suggestions::create_suggestion(&pool, alice, &suggestion(slot.id, song_id))
            .await
            .unwrap();
    }

    let mut changes = SlotChanges {
        assigned_user_id: bob,
        min_songs: slot.min_songs,
        max_songs: slot.max_songs,
        due_at: slot.due_at,
        status: SlotStatus::Pending,
    };
    let reassigned = suggestion_slots::update_slot(&pool, slot.id, &changes)
        .await
        .unwrap();
    assert_eq!(reassigned.assigned_user_id, bob);
    assert_eq!(suggestions::list_by_slot(&pool, slot.id).await.unwrap().len(), 2);

    changes.min_songs = 1;
    changes.max_songs = 1;
    let shrunk = suggestion_slots::update_slot(&pool, slot.id, &changes).await;
    assert!(matches!(shrunk, Err(WorshipError::Capacity(_))));
    assert_eq!(
        suggestion_slots::get_slot_by_id(&pool, slot.id)
            .await
            .unwrap()
            .unwrap()
            .max_songs,
        3
    );
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn rejecting_suggestion_removes_it_without_touching_set() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let (song_id, _) = seed_song(&pool, "Reject").await;

    let slot = suggestion_slots::create_slot(&pool, set_id, musician, 1, 3, Utc::now())
        .await
        .unwrap();
    let pending = suggestions::create_suggestion(&pool, musician, &suggestion(slot.id, song_id))
        .await
        .unwrap();

    assert!(suggestions::delete_suggestion(&pool, pending.id).await.unwrap());

    assert!(suggestions::get_suggestion_by_id(&pool, pending.id).await.unwrap().is_none());
    assert!(worship_sets::list_set_songs(&pool, set_id).await.unwrap().is_empty());
    assert!(!suggestions::delete_suggestion(&pool, pending.id).await.unwrap());
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn invitation_is_answered_once_under_concurrency() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let keys = seed_instrument(&pool, "Keys").await;

    let assignment_id = assignments::create_assignment(
        &pool,
        &CreateAssignmentRequest {
            worship_set_id: set_id,
            instrument_id: keys,
            user_id: musician,
        },
    )
    .await
    .unwrap()
    .id;

    let replies = [AssignmentStatus::Accepted, AssignmentStatus::Declined].map(|reply| {
        let pool = pool.clone();
        tokio::spawn(async move {
            assignments::respond_to_assignment(&pool, assignment_id, musician, reply).await
        })
    });
    let mut answered = 0;
    let mut refused = 0;
    for reply in replies {
        match reply.await.unwrap() {
            Ok(_) => answered += 1,
            Err(WorshipError::Authorization(_)) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!((answered, refused), (1, 1));
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn reply_from_replaced_musician_is_refused() {
    let pool = test_pool().await;
    let alice = seed_user(&pool, &[Role::Musician]).await;
    let bob = seed_user(&pool, &[Role::Musician]).await;
    let set_id = seed_worship_set(&pool).await;
    let drums = seed_instrument(&pool, "Drums").await;

    let first = assignments::replace_for_set(&pool, set_id, &[(drums, Some(alice))])
        .await
        .unwrap();
    let assignment_id = first.assignments[0].id;
    assignments::replace_for_set(&pool, set_id, &[(drums, Some(bob))])
        .await
        .unwrap();

    let stale = assignments::respond_to_assignment(&pool, assignment_id, alice, AssignmentStatus::Accepted).await;
    assert!(matches!(stale, Err(WorshipError::Authorization(_))));

    let answered = assignments::respond_to_assignment(&pool, assignment_id, bob, AssignmentStatus::Declined)
        .await
        .unwrap();
    assert_eq!(answered.status, "declined");
    assert!(answered.responded_at.is_some());
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn refused_service_assignment_map_creates_no_set() {
    let pool = test_pool().await;
    let musician = seed_user(&pool, &[Role::Musician]).await;
    let service_id = seed_service(&pool).await;

    let refused = assignments::replace_for_service(&pool, service_id, &[(Uuid::new_v4(), None)]).await;
    assert!(matches!(refused, Err(WorshipError::NotFound(_))));
    assert!(
        worship_sets::get_worship_set_by_service_id(&pool, service_id)
            .await
            .unwrap()
            .is_none()
    );

    let bass = seed_instrument(&pool, "Bass").await;
    let applied = assignments::replace_for_service(&pool, service_id, &[(bass, Some(musician))])
        .await
        .unwrap();
    let worship_set = worship_sets::get_worship_set_by_service_id(&pool, service_id)
        .await
        .unwrap()
        .expect("draft set created");
    assert_eq!(worship_set.status, "draft");
    assert_eq!(applied.assignments[0].worship_set_id, worship_set.id);

    let missing = assignments::replace_for_service(&pool, Uuid::new_v4(), &[]).await;
    assert!(matches!(missing, Err(WorshipError::NotFound(_))));
}

#[test_log::test(tokio::test)]
#[ignore = "requires TEST_DATABASE_URL"]
async fn leader_and_notes_can_be_cleared() {
    let pool = test_pool().await;
    let leader = seed_user(&pool, &[Role::Leader]).await;
    let service_id = seed_service(&pool).await;
    let set_id = worship_sets::create_worship_set(&pool, service_id, Some(leader), Some("Acoustic"))
        .await
        .unwrap()
        .id;

    let kept = worship_sets::update_worship_set(&pool, set_id, &UpdateWorshipSetRequest::default())
        .await
        .unwrap();
    assert_eq!(kept.leader_user_id, Some(leader));
    assert_eq!(kept.notes.as_deref(), Some("Acoustic"));

    let cleared = worship_sets::update_worship_set(
        &pool,
        set_id,
        &UpdateWorshipSetRequest {
            leader_user_id: Some(None),
            notes: Some(None),
            ..UpdateWorshipSetRequest::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.leader_user_id, None);
    assert_eq!(cleared.notes, None);

    let service = services::update_service(
        &pool,
        service_id,
        &UpdateServiceRequest {
            leader_user_id: Some(Some(leader)),
            ..UpdateServiceRequest::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(service.leader_user_id, Some(leader));
    assert_eq!(service.title.as_deref(), Some("Sunday Morning"));
}
