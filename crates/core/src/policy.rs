//! # Authorization Policy
//!
//! Every allow/deny decision in the service goes through [`evaluate`]. The
//! API applies it twice: once in a route layer, before the request body is
//! read, and once in handlers that know who owns the target row.
//!
//! Rules are expressed per `(Resource, Action)` pair:
//!
//! | Rule | Meaning |
//! |------|---------|
//! | `Authenticated` | any valid token |
//! | `Managers` | admin or leader |
//! | `Admins` | admin only |
//! | `ManagersOrOwner` | admin, leader, or the row's owner |
//! | `AdminsOrOwner` | admin, or the row's owner |
//! | `OwnerOnly` | the row's owner, regardless of role |

use uuid::Uuid;

use crate::{
    errors::{WorshipError, WorshipResult},
    models::{auth::Claims, user::Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Song,
    ServiceType,
    Service,
    WorshipSet,
    SuggestionSlot,
    Suggestion,
    Instrument,
    Assignment,
    Notification,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// A reply by the person a row was addressed to: accepting an
    /// instrument invitation, or marking a suggestion slot as submitted.
    Respond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// Allowed only if the caller owns the row; the owner is not known yet.
    NeedsOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Authenticated,
    Managers,
    Admins,
    ManagersOrOwner,
    AdminsOrOwner,
    OwnerOnly,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl Subject {
    pub fn new(user_id: Uuid, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Admins and leaders manage songs, services and sets.
    pub fn is_manager(&self) -> bool {
        self.is_admin() || self.has_role(Role::Leader)
    }

    /// Evaluates the policy with a known owner and turns anything but
    /// `Allow` into a 403.
    pub fn authorize(
        &self,
        resource: Resource,
        action: Action,
        owner: Option<Uuid>,
    ) -> WorshipResult<()> {
        match evaluate(self, resource, action, owner) {
            Decision::Allow => Ok(()),
            Decision::Deny | Decision::NeedsOwner => Err(WorshipError::forbidden()),
        }
    }
}

impl From<&Claims> for Subject {
    fn from(claims: &Claims) -> Self {
        Subject::new(claims.sub, claims.roles.clone())
    }
}

fn rule_for(resource: Resource, action: Action) -> Rule {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (_, Respond) => Rule::OwnerOnly,

        (Notification, Read) | (Notification, Update) => Rule::AdminsOrOwner,
        (Notification, Create) | (Notification, Delete) => Rule::Managers,

        (User, Read) => Rule::ManagersOrOwner,
        (User, _) => Rule::Admins,

        (Suggestion, Create) => Rule::OwnerOnly,
        (Suggestion, Delete) => Rule::ManagersOrOwner,

        (_, Read) => Rule::Authenticated,
        (_, Create) | (_, Update) | (_, Delete) => Rule::Managers,
    }
}

fn owner_decision(subject: &Subject, owner: Option<Uuid>) -> Decision {
    match owner {
        None => Decision::NeedsOwner,
        Some(owner) if owner == subject.user_id => Decision::Allow,
        Some(_) => Decision::Deny,
    }
}

/// Decides whether `subject` may perform `action` on `resource`.
///
/// `owner` is the user who owns the target row, when the caller knows it.
/// Owner-dependent rules return [`Decision::NeedsOwner`] when it is `None`.
pub fn evaluate(
    subject: &Subject,
    resource: Resource,
    action: Action,
    owner: Option<Uuid>,
) -> Decision {
    let allow_if = |granted: bool| if granted { Decision::Allow } else { Decision::Deny };

    match rule_for(resource, action) {
        Rule::Authenticated => Decision::Allow,
        Rule::Managers => allow_if(subject.is_manager()),
        Rule::Admins => allow_if(subject.is_admin()),
        Rule::ManagersOrOwner if subject.is_manager() => Decision::Allow,
        Rule::AdminsOrOwner if subject.is_admin() => Decision::Allow,
        Rule::ManagersOrOwner | Rule::AdminsOrOwner | Rule::OwnerOnly => {
            owner_decision(subject, owner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn subject(roles: &[Role]) -> Subject {
        Subject::new(Uuid::new_v4(), roles.to_vec())
    }

    #[rstest]
    #[case(Resource::Song)]
    #[case(Resource::Service)]
    #[case(Resource::Instrument)]
    #[case(Resource::WorshipSet)]
    fn musicians_read_but_cannot_write(#[case] resource: Resource) {
        let musician = subject(&[Role::Musician]);

        assert_eq!(evaluate(&musician, resource, Action::Read, None), Decision::Allow);
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(evaluate(&musician, resource, action, None), Decision::Deny);
        }
    }

    #[rstest]
    #[case(Role::Admin)]
    #[case(Role::Leader)]
    fn managers_write_catalog(#[case] role: Role) {
        let manager = subject(&[role]);
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(evaluate(&manager, Resource::Song, action, None), Decision::Allow);
        }
    }

    #[test]
    fn suggestion_create_is_owner_only_even_for_admins() {
        let admin = subject(&[Role::Admin]);
        let other = Uuid::new_v4();

        assert_eq!(
            evaluate(&admin, Resource::Suggestion, Action::Create, None),
            Decision::NeedsOwner
        );
        assert_eq!(
            evaluate(&admin, Resource::Suggestion, Action::Create, Some(other)),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&admin, Resource::Suggestion, Action::Create, Some(admin.user_id)),
            Decision::Allow
        );
    }

    #[test]
    fn notifications_are_private_to_owner_and_admins() {
        let leader = subject(&[Role::Leader]);
        let admin = subject(&[Role::Admin]);
        let someone = Uuid::new_v4();

        assert_eq!(
            evaluate(&leader, Resource::Notification, Action::Read, Some(someone)),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&leader, Resource::Notification, Action::Read, Some(leader.user_id)),
            Decision::Allow
        );
        assert_eq!(
            evaluate(&admin, Resource::Notification, Action::Read, Some(someone)),
            Decision::Allow
        );
        assert_eq!(
            evaluate(&leader, Resource::Notification, Action::Create, None),
            Decision::Allow
        );
    }

    #[test]
    fn user_management_is_admin_only() {
        let leader = subject(&[Role::Leader]);
        let admin = subject(&[Role::Admin]);

        assert_eq!(evaluate(&leader, Resource::User, Action::Read, None), Decision::Allow);
        assert_eq!(evaluate(&leader, Resource::User, Action::Create, None), Decision::Deny);
        assert_eq!(evaluate(&admin, Resource::User, Action::Create, None), Decision::Allow);
    }

    #[test]
    fn respond_requires_ownership() {
        let musician = subject(&[Role::Musician]);
        let admin = subject(&[Role::Admin]);

        assert!(
            musician
                .authorize(Resource::Assignment, Action::Respond, Some(musician.user_id))
                .is_ok()
        );
        assert!(
            admin
                .authorize(Resource::Assignment, Action::Respond, Some(musician.user_id))
                .is_err()
        );
    }

    #[test]
    fn suggestion_delete_allows_owner_or_manager() {
        let musician = subject(&[Role::Musician]);
        let leader = subject(&[Role::Leader]);
        let author = Uuid::new_v4();

        assert_eq!(
            evaluate(&musician, Resource::Suggestion, Action::Delete, Some(author)),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&leader, Resource::Suggestion, Action::Delete, Some(author)),
            Decision::Allow
        );
    }
}
