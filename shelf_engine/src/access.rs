//! The authorization policy for the shelf service.
//!
//! Every resource route funnels its access decision through [`authorize`], which takes the
//! authenticated principal (if any) and the action being attempted, and either allows the
//! request to proceed or denies it. The policy is pure: it never touches the store, so it can
//! run before any query is issued.
//!
//! The moderation gate on game reads is not a yes/no decision but a query clause, so it is
//! expressed separately: [`game_scope`] computes the [`GameScope`] that list and detail
//! queries must apply. The scope is ANDed with any client-supplied narrowing filter,
//! unconditionally.

use thiserror::Error;

use crate::db_types::{Principal, UserId};

/// The set of guarded operations. Mutating user actions carry the target account so the
/// policy can compare it against the acting principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListGames,
    ReadGame,
    CreateGame,
    UpdateGame { touches_status: bool },
    DeleteGame,
    ReadTags,
    WriteTag,
    RegisterUser,
    ListUsers,
    ReadUser,
    UpdateUser { target: UserId, touches_admin: bool },
    DeleteUser { target: UserId },
    EditShelf { target: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The uniform denial. Covers missing credentials as well as insufficient rights, so a
    /// caller can never distinguish "no such route for you" from "not logged in".
    #[error("Unauthorized")]
    Unauthorized,
    /// Account deletion is the one action with no admin override, and it gets a descriptive
    /// error rather than the uniform one.
    #[error("You may only delete your own account")]
    SelfDeleteOnly,
}

/// The moderation filter a games query must apply. Computed here so that no route can forget
/// it: services ask the policy for the scope and pass it to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameScope {
    /// Public and regular-user reads: only approved catalog entries are visible.
    ApprovedOnly,
    /// Admin read paths see every status.
    All,
}

/// Central allow/deny decision. Checks run in a fixed order and the first violation wins.
pub fn authorize(principal: Option<&Principal>, action: &Action) -> Result<(), PolicyError> {
    use Action::*;
    match action {
        // Open to the world, authenticated or not.
        ListGames | ReadGame | ReadTags | ReadUser | RegisterUser => Ok(()),
        // Any authenticated account.
        CreateGame | WriteTag => {
            principal.map(|_| ()).ok_or(PolicyError::Unauthorized)
        },
        // Catalog curation is admin territory. Touching `status` is admin-only in every
        // deployment shape; in the shared-catalog model, so is every other game mutation.
        UpdateGame { .. } | DeleteGame | ListUsers => match principal {
            Some(p) if p.admin => Ok(()),
            _ => Err(PolicyError::Unauthorized),
        },
        UpdateUser { target, touches_admin } => {
            let p = principal.ok_or(PolicyError::Unauthorized)?;
            if *touches_admin {
                // Only an admin may grant or revoke the admin flag, even on themselves.
                if p.admin {
                    Ok(())
                } else {
                    Err(PolicyError::Unauthorized)
                }
            } else if p.id == *target {
                Ok(())
            } else {
                Err(PolicyError::Unauthorized)
            }
        },
        DeleteUser { target } => {
            let p = principal.ok_or(PolicyError::Unauthorized)?;
            if p.id == *target {
                Ok(())
            } else {
                Err(PolicyError::SelfDeleteOnly)
            }
        },
        EditShelf { target } => {
            let p = principal.ok_or(PolicyError::Unauthorized)?;
            if p.id == *target {
                Ok(())
            } else {
                Err(PolicyError::Unauthorized)
            }
        },
    }
}

/// The ownership/moderation filter for game reads. Admins browsing the moderation queue see
/// everything; everyone else sees the approved catalog only.
pub fn game_scope(principal: Option<&Principal>) -> GameScope {
    match principal {
        Some(p) if p.admin => GameScope::All,
        _ => GameScope::ApprovedOnly,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user(id: i64) -> Principal {
        Principal { id: UserId(id), username: format!("user{id}"), name: None, admin: false }
    }

    fn admin(id: i64) -> Principal {
        Principal { id: UserId(id), username: format!("admin{id}"), name: None, admin: true }
    }

    #[test]
    fn anonymous_reads_are_open() {
        for action in [Action::ListGames, Action::ReadGame, Action::ReadTags, Action::ReadUser, Action::RegisterUser] {
            assert!(authorize(None, &action).is_ok(), "{action:?} should be open");
        }
    }

    #[test]
    fn anonymous_writes_are_denied() {
        for action in [
            Action::CreateGame,
            Action::WriteTag,
            Action::UpdateGame { touches_status: false },
            Action::DeleteGame,
            Action::ListUsers,
            Action::UpdateUser { target: UserId(1), touches_admin: false },
            Action::EditShelf { target: UserId(1) },
        ] {
            assert_eq!(authorize(None, &action), Err(PolicyError::Unauthorized), "{action:?}");
        }
    }

    #[test]
    fn only_admins_touch_the_catalog() {
        let alice = user(1);
        let root = admin(9);
        for action in
            [Action::UpdateGame { touches_status: false }, Action::UpdateGame { touches_status: true }, Action::DeleteGame]
        {
            assert_eq!(authorize(Some(&alice), &action), Err(PolicyError::Unauthorized));
            assert!(authorize(Some(&root), &action).is_ok());
        }
    }

    #[test]
    fn any_account_may_submit_games_and_tags() {
        let alice = user(1);
        assert!(authorize(Some(&alice), &Action::CreateGame).is_ok());
        assert!(authorize(Some(&alice), &Action::WriteTag).is_ok());
    }

    #[test]
    fn user_list_is_admin_only_but_single_reads_are_open() {
        let alice = user(1);
        assert_eq!(authorize(Some(&alice), &Action::ListUsers), Err(PolicyError::Unauthorized));
        assert!(authorize(Some(&admin(9)), &Action::ListUsers).is_ok());
        // The single-read asymmetry is intentional and preserved.
        assert!(authorize(None, &Action::ReadUser).is_ok());
    }

    #[test]
    fn users_update_themselves_but_never_the_admin_flag() {
        let alice = user(1);
        assert!(authorize(Some(&alice), &Action::UpdateUser { target: UserId(1), touches_admin: false }).is_ok());
        assert_eq!(
            authorize(Some(&alice), &Action::UpdateUser { target: UserId(2), touches_admin: false }),
            Err(PolicyError::Unauthorized)
        );
        // Not even on their own account.
        assert_eq!(
            authorize(Some(&alice), &Action::UpdateUser { target: UserId(1), touches_admin: true }),
            Err(PolicyError::Unauthorized)
        );
    }

    #[test]
    fn admins_may_promote_other_users() {
        let root = admin(9);
        assert!(authorize(Some(&root), &Action::UpdateUser { target: UserId(1), touches_admin: true }).is_ok());
        assert!(authorize(Some(&root), &Action::UpdateUser { target: UserId(9), touches_admin: true }).is_ok());
    }

    #[test]
    fn account_deletion_has_no_admin_override() {
        let alice = user(1);
        let root = admin(9);
        assert!(authorize(Some(&alice), &Action::DeleteUser { target: UserId(1) }).is_ok());
        assert_eq!(authorize(Some(&root), &Action::DeleteUser { target: UserId(1) }), Err(PolicyError::SelfDeleteOnly));
        assert_eq!(
            PolicyError::SelfDeleteOnly.to_string(),
            "You may only delete your own account"
        );
    }

    #[test]
    fn shelves_are_private() {
        let alice = user(1);
        assert!(authorize(Some(&alice), &Action::EditShelf { target: UserId(1) }).is_ok());
        assert_eq!(
            authorize(Some(&alice), &Action::EditShelf { target: UserId(2) }),
            Err(PolicyError::Unauthorized)
        );
    }

    #[test]
    fn moderation_scope_follows_the_admin_flag() {
        assert_eq!(game_scope(None), GameScope::ApprovedOnly);
        assert_eq!(game_scope(Some(&user(1))), GameScope::ApprovedOnly);
        assert_eq!(game_scope(Some(&admin(9))), GameScope::All);
    }
}
