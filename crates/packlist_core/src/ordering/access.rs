//! Access-control seam consulted before any move is committed.

use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::repo::RepoResult;

/// Decides whether a caller may modify entities guarded by one list.
pub trait AccessPolicy {
    fn can_modify_list(&self, list_id: ListId, caller: UserId) -> RepoResult<bool>;
}

impl<A: AccessPolicy + ?Sized> AccessPolicy for &A {
    fn can_modify_list(&self, list_id: ListId, caller: UserId) -> RepoResult<bool> {
        (**self).can_modify_list(list_id, caller)
    }
}
