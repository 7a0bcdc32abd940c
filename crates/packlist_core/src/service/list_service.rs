//! Packing list use-case service.
//!
//! # Responsibility
//! - Create, edit, reorder, share, and copy packing lists.
//! - Assemble the expanded list read model.
//!
//! # Invariants
//! - Only non-pending members see or modify a list.
//! - Only admins invite; invitations start pending.
//! - A `sort_order` in a patch is applied through the move coordinator, so
//!   the caller's visible lists stay densely numbered.

use crate::model::category::ExpandedCategory;
use crate::model::list::{ExpandedList, ListId, ListMember, ListPatch, NewList, PackingList};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::{MoveCoordinator, ScopeResolver};
use crate::repo::category_item_repo::{CategoryItemRepository, SqliteCategoryItemRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use crate::repo::ordering_store::{ListScope, ListScopeResolver, SqliteAccessPolicy};
use crate::service::{ensure_list_access, ensure_move_position, ServiceError, ServiceResult};
use rusqlite::Connection;

/// Packing list service facade.
pub struct ListService<'conn> {
    lists: SqliteListRepository<'conn>,
    categories: SqliteCategoryRepository<'conn>,
    category_items: SqliteCategoryItemRepository<'conn>,
    access: SqliteAccessPolicy<'conn>,
    mover: MoveCoordinator<ListScopeResolver<'conn>, SqliteAccessPolicy<'conn>>,
}

impl<'conn> ListService<'conn> {
    /// Creates service from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        let access = SqliteAccessPolicy::try_new(conn)?;
        Ok(Self {
            lists: SqliteListRepository::try_new(conn)?,
            categories: SqliteCategoryRepository::try_new(conn)?,
            category_items: SqliteCategoryItemRepository::try_new(conn)?,
            access,
            mover: MoveCoordinator::new(ListScopeResolver::try_new(conn)?, access),
        })
    }

    /// Lists the caller's visible lists in position order.
    pub fn list_for_user(&self, caller: UserId) -> ServiceResult<Vec<PackingList>> {
        Ok(self.lists.list_for_user(caller)?)
    }

    /// Loads one list with its categories and items, all in position order.
    pub fn get_expanded(&self, caller: UserId, list_id: ListId) -> ServiceResult<ExpandedList> {
        let list = self.require_accessible(caller, list_id)?;
        let mut categories = Vec::new();
        for category in self.categories.list_categories(list_id)? {
            let items = self.category_items.list_expanded_for_category(category.id)?;
            categories.push(ExpandedCategory::new(category, items));
        }
        Ok(ExpandedList { list, categories })
    }

    /// Creates one list at the end of the caller's lists; caller becomes admin.
    pub fn create(&self, caller: UserId, input: NewList) -> ServiceResult<PackingList> {
        let input = NewList {
            name: input.name.trim().to_string(),
            description: input.description,
        };
        Ok(self.lists.create_list(caller, &input)?)
    }

    /// Applies field edits, then moves the list when `sort_order` is set.
    ///
    /// An out-of-range `sort_order` rejects the whole patch before any field
    /// is written.
    pub fn update(
        &self,
        caller: UserId,
        list_id: ListId,
        patch: ListPatch,
    ) -> ServiceResult<PackingList> {
        self.require_accessible(caller, list_id)?;
        if let Some(target) = patch.sort_order {
            let sibling_count = self
                .mover
                .resolver()
                .load_siblings_ordered(&ListScope { user_id: caller })?
                .len();
            ensure_move_position(target, sibling_count)?;
        }

        let name = patch.name.as_deref().map(str::trim);
        if name.is_some() || patch.description.is_some() {
            self.lists
                .update_list_fields(list_id, name, patch.description.as_deref())?;
        }

        match patch.sort_order {
            Some(target) => Ok(self.mover.move_entity(caller, list_id, target)?),
            None => self.require_list(list_id),
        }
    }

    pub fn remove(&self, caller: UserId, list_id: ListId) -> ServiceResult<()> {
        self.require_accessible(caller, list_id)?;
        Ok(self.lists.delete_list(list_id)?)
    }

    /// Marks every category item of the list unpacked.
    pub fn unpack(&self, caller: UserId, list_id: ListId) -> ServiceResult<usize> {
        self.require_accessible(caller, list_id)?;
        Ok(self.lists.unpack_list(list_id)?)
    }

    /// Copies a list with its categories and items for the caller.
    pub fn duplicate(&self, caller: UserId, list_id: ListId) -> ServiceResult<PackingList> {
        self.require_accessible(caller, list_id)?;
        let copy_id = self.lists.duplicate_list(list_id, caller)?;
        self.require_list(copy_id)
    }

    /// Invites `user_id` into the list. Only admins may invite.
    pub fn add_member(
        &self,
        caller: UserId,
        list_id: ListId,
        user_id: UserId,
        is_admin: bool,
    ) -> ServiceResult<ListMember> {
        self.require_list(list_id)?;
        let caller_is_admin = self
            .lists
            .get_member(list_id, caller)?
            .is_some_and(|member| member.is_admin && !member.is_pending);
        if !caller_is_admin {
            return Err(ServiceError::Forbidden {
                kind: EntityKind::List,
                id: list_id,
            });
        }
        if self.lists.get_member(list_id, user_id)?.is_some() {
            return Err(ServiceError::Conflict {
                kind: EntityKind::User,
                id: user_id,
            });
        }

        let member = ListMember {
            list_id,
            user_id,
            is_admin,
            is_pending: true,
        };
        self.lists.upsert_member(&member)?;
        Ok(member)
    }

    /// Accepts a pending invitation held by the caller.
    pub fn accept_invite(&self, caller: UserId, list_id: ListId) -> ServiceResult<ListMember> {
        let member = self
            .lists
            .get_member(list_id, caller)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::List,
                id: list_id,
            })?;
        if !member.is_pending {
            return Ok(member);
        }
        self.lists.accept_membership(list_id, caller)?;
        Ok(ListMember {
            is_pending: false,
            ..member
        })
    }

    fn require_list(&self, list_id: ListId) -> ServiceResult<PackingList> {
        self.lists.get_list(list_id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::List,
            id: list_id,
        })
    }

    fn require_accessible(&self, caller: UserId, list_id: ListId) -> ServiceResult<PackingList> {
        let list = self.require_list(list_id)?;
        ensure_list_access(&self.access, list_id, caller, EntityKind::List, list_id)?;
        Ok(list)
    }
}
