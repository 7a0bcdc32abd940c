//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the move coordinator into use-case
//!   level APIs.
//! - Enforce list membership before every mutation.
//!
//! # Invariants
//! - Existence is checked before access: a missing target is `NotFound`,
//!   never `Forbidden`.
//! - Move failures map one-to-one onto `ServiceError` variants.

pub mod category_item_service;
pub mod category_service;
pub mod feedback_service;
pub mod item_service;
pub mod list_service;
pub mod user_service;

use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::{AccessPolicy, MoveError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error shared by all use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Target entity does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// Caller is not allowed to touch the target.
    Forbidden { kind: EntityKind, id: Uuid },
    /// Target state conflicts with the request.
    Conflict { kind: EntityKind, id: Uuid },
    /// Requested position is outside the sibling range.
    InvalidArgument {
        target_position: i64,
        sibling_count: usize,
    },
    /// Input failed field validation.
    Validation(String),
    /// Repository-level failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } => "conflict",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Validation(_) => "validation_failed",
            Self::Repo(_) => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Forbidden { kind, id } => write!(f, "access to {kind} {id} denied"),
            Self::Conflict { kind, id } => write!(f, "{kind} {id} conflicts with current state"),
            Self::InvalidArgument {
                target_position,
                sibling_count,
            } => write!(
                f,
                "target position {target_position} is outside 0..{sibling_count}"
            ),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<MoveError> for ServiceError {
    fn from(value: MoveError) -> Self {
        match value {
            MoveError::NotFound { kind, id } => Self::NotFound { kind, id },
            MoveError::Forbidden { kind, id } => Self::Forbidden { kind, id },
            MoveError::Conflict { kind, id } => Self::Conflict { kind, id },
            MoveError::InvalidArgument {
                target_position,
                sibling_count,
            } => Self::InvalidArgument {
                target_position,
                sibling_count,
            },
            MoveError::Store(err) => Self::Repo(err),
        }
    }
}

/// Fails with `Forbidden { kind, id }` unless `caller` may modify `list_id`.
pub(crate) fn ensure_list_access<A: AccessPolicy>(
    access: &A,
    list_id: ListId,
    caller: UserId,
    kind: EntityKind,
    id: Uuid,
) -> ServiceResult<()> {
    if access.can_modify_list(list_id, caller)? {
        Ok(())
    } else {
        Err(ServiceError::Forbidden { kind, id })
    }
}

/// Rejects a move target outside `[0, sibling_count - 1]`.
///
/// Same bounds as the move coordinator; used to reject a patch before any
/// of its field edits are written.
pub(crate) fn ensure_move_position(position: i64, sibling_count: usize) -> ServiceResult<()> {
    match usize::try_from(position) {
        Ok(index) if index < sibling_count => Ok(()),
        _ => Err(ServiceError::InvalidArgument {
            target_position: position,
            sibling_count,
        }),
    }
}

/// Rejects a requested insert position outside `[0, sibling_count]`.
pub(crate) fn ensure_insert_position(position: i64, sibling_count: usize) -> ServiceResult<()> {
    match usize::try_from(position) {
        Ok(index) if index <= sibling_count => Ok(()),
        _ => Err(ServiceError::InvalidArgument {
            target_position: position,
            sibling_count: sibling_count + 1,
        }),
    }
}
