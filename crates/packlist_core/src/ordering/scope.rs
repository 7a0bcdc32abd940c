//! Sibling-scope contracts used by the move coordinator.
//!
//! # Responsibility
//! - Let each entity kind define its sibling set and parent anchor.
//! - Keep storage details behind the resolver boundary.
//!
//! # Invariants
//! - `load_siblings_ordered` returns ids ascending by stored position, with a
//!   deterministic tie-break, and never filters on exact position values.
//! - `persist_positions` writes `position = index` for every id it receives.

use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::RepoResult;
use std::fmt::Debug;
use uuid::Uuid;

/// One sibling's id and stored position as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingPosition {
    pub id: Uuid,
    pub position: i64,
}

/// Result of resolving an entity to its sibling scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBinding<S> {
    /// Key identifying the sibling set.
    pub scope: S,
    /// List whose membership guards writes to this scope.
    pub access_list: ListId,
}

/// Per-kind definition of a sibling set.
pub trait ScopeResolver {
    /// Key of one sibling set (parent id, or caller for the list scope).
    type Scope: Debug;
    /// Fresh read model returned after a move.
    type Entity;

    /// Entity kind this resolver orders.
    fn kind(&self) -> EntityKind;

    /// Looks up the sibling scope of `entity_id` as seen by `caller`.
    ///
    /// Returns `Ok(None)` when the entity or its scope does not exist.
    fn resolve_scope(
        &self,
        caller: UserId,
        entity_id: Uuid,
    ) -> RepoResult<Option<ScopeBinding<Self::Scope>>>;

    /// Loads all siblings of `scope` ordered by stored position.
    fn load_siblings_ordered(&self, scope: &Self::Scope) -> RepoResult<Vec<SiblingPosition>>;

    /// Rewrites positions so that `ordered_ids[i]` gets position `i`.
    ///
    /// Returns the number of rows written. Ids that vanished since the load
    /// are skipped rather than reported.
    fn persist_positions(&self, scope: &Self::Scope, ordered_ids: &[Uuid]) -> RepoResult<usize>;

    /// Loads the current state of one entity.
    fn load_entity(&self, entity_id: Uuid) -> RepoResult<Option<Self::Entity>>;
}

impl<R: ScopeResolver + ?Sized> ScopeResolver for &R {
    type Scope = R::Scope;
    type Entity = R::Entity;

    fn kind(&self) -> EntityKind {
        (**self).kind()
    }

    fn resolve_scope(
        &self,
        caller: UserId,
        entity_id: Uuid,
    ) -> RepoResult<Option<ScopeBinding<Self::Scope>>> {
        (**self).resolve_scope(caller, entity_id)
    }

    fn load_siblings_ordered(&self, scope: &Self::Scope) -> RepoResult<Vec<SiblingPosition>> {
        (**self).load_siblings_ordered(scope)
    }

    fn persist_positions(&self, scope: &Self::Scope, ordered_ids: &[Uuid]) -> RepoResult<usize> {
        (**self).persist_positions(scope, ordered_ids)
    }

    fn load_entity(&self, entity_id: Uuid) -> RepoResult<Option<Self::Entity>> {
        (**self).load_entity(entity_id)
    }
}

/// Returns whether stored positions are exactly `0..n-1` in load order.
pub fn positions_are_dense(siblings: &[SiblingPosition]) -> bool {
    siblings
        .iter()
        .enumerate()
        .all(|(index, sibling)| sibling.position == index as i64)
}

#[cfg(test)]
mod tests {
    use super::{positions_are_dense, SiblingPosition};
    use uuid::Uuid;

    fn siblings(positions: &[i64]) -> Vec<SiblingPosition> {
        positions
            .iter()
            .map(|position| SiblingPosition {
                id: Uuid::new_v4(),
                position: *position,
            })
            .collect()
    }

    #[test]
    fn dense_positions_are_detected() {
        assert!(positions_are_dense(&[]));
        assert!(positions_are_dense(&siblings(&[0, 1, 2])));
    }

    #[test]
    fn gaps_and_ties_are_not_dense() {
        assert!(!positions_are_dense(&siblings(&[0, 2, 3])));
        assert!(!positions_are_dense(&siblings(&[0, 1, 1])));
        assert!(!positions_are_dense(&siblings(&[1, 2])));
    }
}
