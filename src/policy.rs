//! Access policy: who may read or mutate which record.
//!
//! Every protected handler calls [`authorize`] first, before any lookup, so a caller that
//! fails the policy learns nothing about whether the target exists.

use crate::{auth::Identity, error::AppError, models::Role};

/// What a route requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any verified identity.
    Authenticated,
    /// Administrators only.
    Admin,
    /// The student the record belongs to, or an administrator.
    SelfOrAdmin(i32),
}

/// The outcome of evaluating a [`Requirement`] against an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The identity is scoped to a different student.
    Forbid,
    /// The route needs a role the identity does not hold.
    RequireRole(Role),
}

/// True if the identity may act on the given student's records: always for Admin, and for a
/// Student only when the target is their own bound student id.
pub fn can_access(identity: &Identity, target_student_id: i32) -> bool {
    match identity.role() {
        Role::Admin => true,
        Role::Student => identity.student_id() == Some(target_student_id),
    }
}

pub fn decide(identity: &Identity, requirement: Requirement) -> Decision {
    match requirement {
        Requirement::Authenticated => Decision::Allow,
        Requirement::Admin if identity.is_admin() => Decision::Allow,
        Requirement::Admin => Decision::RequireRole(Role::Admin),
        Requirement::SelfOrAdmin(student_id) if can_access(identity, student_id) => {
            Decision::Allow
        }
        Requirement::SelfOrAdmin(_) => Decision::Forbid,
    }
}

/// Evaluates the requirement and turns any denial into `AppError::Forbidden`.
pub fn authorize(identity: &Identity, requirement: Requirement) -> Result<(), AppError> {
    match decide(identity, requirement) {
        Decision::Allow => Ok(()),
        denied => {
            tracing::warn!(
                email = identity.email(),
                ?requirement,
                decision = ?denied,
                "access denied"
            );
            Err(AppError::Forbidden)
        }
    }
}
