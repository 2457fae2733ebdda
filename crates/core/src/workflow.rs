//! # Suggestion and Assignment Workflow Rules
//!
//! Pure rule checks used by the transactional repositories. Each check is
//! evaluated inside the transaction that performs the write, against rows
//! read under lock, so the limits hold under concurrent requests.

use uuid::Uuid;

use crate::errors::{WorshipError, WorshipResult};

/// Maximum number of songs in a worship set's final lineup.
pub const MAX_SET_SONGS: usize = 6;

/// Maximum number of set songs flagged as new to the congregation.
pub const MAX_NEW_SET_SONGS: usize = 1;

pub fn validate_slot_bounds(min_songs: i32, max_songs: i32) -> WorshipResult<()> {
    if min_songs < 0 {
        return Err(WorshipError::Validation(
            "minSongs must not be negative".to_string(),
        ));
    }
    if max_songs < 1 {
        return Err(WorshipError::Validation(
            "maxSongs must be at least 1".to_string(),
        ));
    }
    if min_songs > max_songs {
        return Err(WorshipError::Validation(format!(
            "minSongs ({}) must not exceed maxSongs ({})",
            min_songs, max_songs
        )));
    }
    Ok(())
}

/// Checks that one more suggestion fits into a slot.
pub fn ensure_slot_capacity(existing: i64, max_songs: i32) -> WorshipResult<()> {
    if existing >= i64::from(max_songs) {
        return Err(WorshipError::Capacity(format!(
            "This suggestion slot already holds the maximum of {} songs",
            max_songs
        )));
    }
    Ok(())
}

/// Checks that a slot holds enough suggestions to be marked submitted.
pub fn ensure_slot_submittable(existing: i64, min_songs: i32) -> WorshipResult<()> {
    if existing < i64::from(min_songs) {
        return Err(WorshipError::Validation(format!(
            "At least {} suggestions are required before submitting, found {}",
            min_songs, existing
        )));
    }
    Ok(())
}

/// Position and novelty of a song already in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub position: i32,
    pub is_new: bool,
}

/// Picks the position for a song joining a set.
///
/// Returns the lowest free position in `1..=MAX_SET_SONGS`, or a capacity
/// error when the set is full or a second new song would be added.
pub fn next_set_song_position(occupied: &[Placement], is_new: bool) -> WorshipResult<i32> {
    if occupied.len() >= MAX_SET_SONGS {
        return Err(WorshipError::Capacity(format!(
            "A worship set holds at most {} songs",
            MAX_SET_SONGS
        )));
    }

    let new_songs = occupied.iter().filter(|placement| placement.is_new).count();
    if is_new && new_songs >= MAX_NEW_SET_SONGS {
        return Err(WorshipError::Capacity(format!(
            "A worship set may include at most {} new song",
            MAX_NEW_SET_SONGS
        )));
    }

    (1..=MAX_SET_SONGS as i32)
        .find(|candidate| !occupied.iter().any(|placement| placement.position == *candidate))
        .ok_or_else(|| {
            WorshipError::Capacity(format!(
                "No free position left in a set of {} songs",
                MAX_SET_SONGS
            ))
        })
}

/// Resolves the key a set song is played in: the set's override, then the
/// version's key, then the song's default. Blank values count as unset.
pub fn resolve_key<'a>(
    key_override: Option<&'a str>,
    version_key: Option<&'a str>,
    default_key: Option<&'a str>,
) -> Option<&'a str> {
    [key_override, version_key, default_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
}

/// An instrument assignment as currently stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAssignment {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentChange {
    Create { instrument_id: Uuid, user_id: Uuid },
    Reassign { assignment_id: Uuid, user_id: Uuid },
    Remove { assignment_id: Uuid },
}

/// Diffs the requested instrument map against what is stored.
///
/// Instruments missing from `desired` are left alone; an instrument whose
/// user is unchanged produces no change, so its status survives.
pub fn plan_assignment_changes(
    current: &[CurrentAssignment],
    desired: &[(Uuid, Option<Uuid>)],
) -> Vec<AssignmentChange> {
    desired
        .iter()
        .filter_map(|(instrument_id, user_id)| {
            let existing = current
                .iter()
                .find(|assignment| assignment.instrument_id == *instrument_id);

            match (existing, user_id) {
                (None, None) => None,
                (None, Some(user_id)) => Some(AssignmentChange::Create {
                    instrument_id: *instrument_id,
                    user_id: *user_id,
                }),
                (Some(assignment), None) => Some(AssignmentChange::Remove {
                    assignment_id: assignment.id,
                }),
                (Some(assignment), Some(user_id)) if assignment.user_id == *user_id => None,
                (Some(assignment), Some(user_id)) => Some(AssignmentChange::Reassign {
                    assignment_id: assignment.id,
                    user_id: *user_id,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn placements(entries: &[(i32, bool)]) -> Vec<Placement> {
        entries
            .iter()
            .map(|(position, is_new)| Placement {
                position: *position,
                is_new: *is_new,
            })
            .collect()
    }

    #[rstest]
    #[case(0, 2, true)]
    #[case(1, 2, true)]
    #[case(2, 2, false)]
    #[case(3, 2, false)]
    fn slot_capacity(#[case] existing: i64, #[case] max: i32, #[case] fits: bool) {
        let result = ensure_slot_capacity(existing, max);
        assert_eq!(result.is_ok(), fits);
        if !fits {
            assert!(matches!(result, Err(WorshipError::Capacity(_))));
        }
    }

    #[rstest]
    #[case(0, 1, true)]
    #[case(2, 2, true)]
    #[case(3, 2, false)]
    #[case(-1, 2, false)]
    #[case(0, 0, false)]
    fn slot_bounds(#[case] min: i32, #[case] max: i32, #[case] valid: bool) {
        assert_eq!(validate_slot_bounds(min, max).is_ok(), valid);
    }

    #[test]
    fn submit_requires_min_songs() {
        assert!(ensure_slot_submittable(0, 1).is_err());
        assert!(ensure_slot_submittable(1, 1).is_ok());
        assert!(ensure_slot_submittable(0, 0).is_ok());
    }

    #[test]
    fn first_song_goes_to_position_one() {
        assert_eq!(next_set_song_position(&[], false).unwrap(), 1);
    }

    #[test]
    fn fills_gaps_before_appending() {
        let occupied = placements(&[(1, false), (3, false)]);
        assert_eq!(next_set_song_position(&occupied, false).unwrap(), 2);

        let occupied = placements(&[(1, false), (2, false)]);
        assert_eq!(next_set_song_position(&occupied, false).unwrap(), 3);
    }

    #[test]
    fn full_set_is_a_capacity_error() {
        let occupied = placements(&[
            (1, false),
            (2, false),
            (3, false),
            (4, false),
            (5, false),
            (6, false),
        ]);
        assert!(matches!(
            next_set_song_position(&occupied, false),
            Err(WorshipError::Capacity(_))
        ));
    }

    #[test]
    fn only_one_new_song_per_set() {
        let occupied = placements(&[(1, true)]);
        assert!(matches!(
            next_set_song_position(&occupied, true),
            Err(WorshipError::Capacity(_))
        ));
        assert_eq!(next_set_song_position(&occupied, false).unwrap(), 2);
    }

    #[rstest]
    #[case(Some("D"), Some("C"), Some("G"), Some("D"))]
    #[case(None, Some("C"), Some("G"), Some("C"))]
    #[case(Some(""), Some(" "), Some("G"), Some("G"))]
    #[case(None, None, None, None)]
    fn key_resolution(
        #[case] key_override: Option<&str>,
        #[case] version_key: Option<&str>,
        #[case] default_key: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(resolve_key(key_override, version_key, default_key), expected);
    }

    #[test]
    fn assignment_plan_covers_every_case() {
        let keys = Uuid::new_v4();
        let drums = Uuid::new_v4();
        let bass = Uuid::new_v4();
        let guitar = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let current = vec![
            CurrentAssignment { id: Uuid::new_v4(), instrument_id: keys, user_id: alice },
            CurrentAssignment { id: Uuid::new_v4(), instrument_id: drums, user_id: alice },
            CurrentAssignment { id: Uuid::new_v4(), instrument_id: bass, user_id: bob },
        ];
        let desired = vec![
            (keys, Some(alice)),
            (drums, Some(bob)),
            (bass, None),
            (guitar, Some(bob)),
        ];

        let changes = plan_assignment_changes(&current, &desired);

        assert_eq!(
            changes,
            vec![
                AssignmentChange::Reassign { assignment_id: current[1].id, user_id: bob },
                AssignmentChange::Remove { assignment_id: current[2].id },
                AssignmentChange::Create { instrument_id: guitar, user_id: bob },
            ]
        );
    }

    #[test]
    fn clearing_an_empty_instrument_is_a_no_op() {
        let changes = plan_assignment_changes(&[], &[(Uuid::new_v4(), None)]);
        assert!(changes.is_empty());
    }
}
