//! Move orchestration over one sibling scope.
//!
//! # Responsibility
//! - Run one move end-to-end: resolve scope, check access, load current
//!   order, reorder, persist the full rewrite, return fresh entity state.
//!
//! # Invariants
//! - `NotFound`, `Forbidden`, `Conflict`, and `InvalidArgument` abort before
//!   any position is written.
//! - The loaded order (not stored integers) is authoritative; the rewrite
//!   assigns `0..n-1` to every sibling regardless of how far the entity moved.
//! - Concurrent moves on one scope are not serialized here; each rewrite is
//!   dense on its own, so the last writer leaves a dense set.

use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::access::AccessPolicy;
use crate::ordering::scope::{positions_are_dense, ScopeResolver};
use crate::ordering::sequencer::reorder;
use crate::repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Failure of one move request.
#[derive(Debug)]
pub enum MoveError {
    /// Entity or its scope does not exist.
    NotFound { kind: EntityKind, id: Uuid },
    /// Caller lacks modify access to the resolved scope.
    Forbidden { kind: EntityKind, id: Uuid },
    /// Entity vanished between scope resolution and sibling load.
    Conflict { kind: EntityKind, id: Uuid },
    /// Target position lies outside `[0, sibling_count - 1]`.
    InvalidArgument {
        target_position: i64,
        sibling_count: usize,
    },
    /// Storage failure.
    Store(RepoError),
}

impl MoveError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } => "conflict",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Store(_) => "store_failed",
        }
    }
}

impl Display for MoveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Forbidden { kind, id } => write!(f, "not allowed to move {kind} {id}"),
            Self::Conflict { kind, id } => {
                write!(f, "{kind} {id} disappeared while it was being moved")
            }
            Self::InvalidArgument {
                target_position,
                sibling_count,
            } => write!(
                f,
                "target position {target_position} is outside 0..{sibling_count}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MoveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MoveError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Store(other),
        }
    }
}

/// Generic move entry point, instantiated once per entity kind.
pub struct MoveCoordinator<R, A> {
    resolver: R,
    access: A,
}

impl<R: ScopeResolver, A: AccessPolicy> MoveCoordinator<R, A> {
    pub fn new(resolver: R, access: A) -> Self {
        Self { resolver, access }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Moves `entity_id` to `target_position` within its sibling set.
    ///
    /// # Errors
    /// - `NotFound` when the entity or its scope does not exist.
    /// - `Forbidden` when `caller` may not modify the scope.
    /// - `Conflict` when the entity is missing from the loaded sibling set.
    /// - `InvalidArgument` when `target_position` is outside `[0, n-1]`;
    ///   out-of-range targets are rejected, never clamped.
    /// - `Store` on storage failures.
    pub fn move_entity(
        &self,
        caller: UserId,
        entity_id: Uuid,
        target_position: i64,
    ) -> Result<R::Entity, MoveError> {
        let started_at = Instant::now();
        let kind = self.resolver.kind();

        match self.try_move(caller, entity_id, target_position) {
            Ok((entity, from_index, sibling_count)) => {
                info!(
                    "event=entity_move module=ordering status=ok kind={} id={} from={} to={} sibling_count={} duration_ms={}",
                    kind,
                    entity_id,
                    from_index,
                    target_position,
                    sibling_count,
                    started_at.elapsed().as_millis()
                );
                Ok(entity)
            }
            Err(err) => {
                let log_line = format!(
                    "event=entity_move module=ordering status=error kind={} id={} to={} duration_ms={} error_code={}",
                    kind,
                    entity_id,
                    target_position,
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                match &err {
                    MoveError::Store(_) => error!("{log_line} error={err}"),
                    _ => warn!("{log_line}"),
                }
                Err(err)
            }
        }
    }

    fn try_move(
        &self,
        caller: UserId,
        entity_id: Uuid,
        target_position: i64,
    ) -> Result<(R::Entity, usize, usize), MoveError> {
        let kind = self.resolver.kind();

        let binding = self
            .resolver
            .resolve_scope(caller, entity_id)?
            .ok_or(MoveError::NotFound {
                kind,
                id: entity_id,
            })?;

        if !self.access.can_modify_list(binding.access_list, caller)? {
            return Err(MoveError::Forbidden {
                kind,
                id: entity_id,
            });
        }

        let siblings = self.resolver.load_siblings_ordered(&binding.scope)?;
        if !positions_are_dense(&siblings) {
            warn!(
                "event=sibling_positions_dirty module=ordering status=ok kind={} scope={:?} sibling_count={}",
                kind,
                binding.scope,
                siblings.len()
            );
        }

        let ordered_ids: Vec<Uuid> = siblings.iter().map(|sibling| sibling.id).collect();
        let start_index = ordered_ids
            .iter()
            .position(|id| *id == entity_id)
            .ok_or(MoveError::Conflict {
                kind,
                id: entity_id,
            })?;

        let sibling_count = ordered_ids.len();
        let finish_index = usize::try_from(target_position)
            .ok()
            .filter(|index| *index < sibling_count)
            .ok_or(MoveError::InvalidArgument {
                target_position,
                sibling_count,
            })?;

        let reordered = reorder(ordered_ids, start_index, finish_index).map_err(|_| {
            MoveError::InvalidArgument {
                target_position,
                sibling_count,
            }
        })?;
        self.resolver.persist_positions(&binding.scope, &reordered)?;

        let entity = self
            .resolver
            .load_entity(entity_id)?
            .ok_or(MoveError::Conflict {
                kind,
                id: entity_id,
            })?;
        Ok((entity, start_index, sibling_count))
    }
}
