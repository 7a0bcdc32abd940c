//! Category use-case service.
//!
//! # Responsibility
//! - Create, rename, reorder, and remove categories inside one list.
//! - Bulk packing and cross-list copy of categories.
//!
//! # Invariants
//! - Every operation checks membership of the list owning the category;
//!   `copy_to_list` checks both the source and the target list.

use crate::model::category::{Category, CategoryId, CategoryPatch, ExpandedCategory, OtherCategory};
use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::{MoveCoordinator, ScopeResolver};
use crate::repo::category_item_repo::{CategoryItemRepository, SqliteCategoryItemRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use crate::repo::ordering_store::{CategoryScope, CategoryScopeResolver, SqliteAccessPolicy};
use crate::service::{ensure_list_access, ensure_move_position, ServiceError, ServiceResult};
use rusqlite::Connection;

/// Category service facade.
pub struct CategoryService<'conn> {
    lists: SqliteListRepository<'conn>,
    categories: SqliteCategoryRepository<'conn>,
    category_items: SqliteCategoryItemRepository<'conn>,
    access: SqliteAccessPolicy<'conn>,
    mover: MoveCoordinator<CategoryScopeResolver<'conn>, SqliteAccessPolicy<'conn>>,
}

impl<'conn> CategoryService<'conn> {
    /// Creates service from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        let access = SqliteAccessPolicy::try_new(conn)?;
        Ok(Self {
            lists: SqliteListRepository::try_new(conn)?,
            categories: SqliteCategoryRepository::try_new(conn)?,
            category_items: SqliteCategoryItemRepository::try_new(conn)?,
            access,
            mover: MoveCoordinator::new(CategoryScopeResolver::try_new(conn)?, access),
        })
    }

    /// Appends a new category to `list_id`.
    pub fn create(
        &self,
        caller: UserId,
        list_id: ListId,
        name: impl Into<String>,
    ) -> ServiceResult<Category> {
        self.require_list_access(caller, list_id)?;
        let name = name.into();
        Ok(self.categories.create_category(list_id, name.trim())?)
    }

    /// Renames and/or moves one category.
    ///
    /// The target position is checked before the rename is written.
    pub fn update(
        &self,
        caller: UserId,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> ServiceResult<Category> {
        let category = self.require_accessible(caller, category_id)?;
        if let Some(target) = patch.sort_order {
            let sibling_count = self
                .mover
                .resolver()
                .load_siblings_ordered(&CategoryScope {
                    list_id: category.list_id,
                })?
                .len();
            ensure_move_position(target, sibling_count)?;
        }

        if let Some(name) = patch.name.as_deref() {
            self.categories.rename_category(category_id, name.trim())?;
        }
        match patch.sort_order {
            Some(target) => Ok(self.mover.move_entity(caller, category_id, target)?),
            None => self.require_category(category_id),
        }
    }

    /// Deletes one category with its item placements.
    ///
    /// Remaining siblings keep their stored positions; the gap is closed by
    /// the next move in the list.
    pub fn remove(&self, caller: UserId, category_id: CategoryId) -> ServiceResult<()> {
        self.require_accessible(caller, category_id)?;
        Ok(self.categories.delete_category(category_id)?)
    }

    /// Packs every item, or unpacks every item when all are already packed.
    pub fn toggle_packed(
        &self,
        caller: UserId,
        category_id: CategoryId,
    ) -> ServiceResult<ExpandedCategory> {
        let category = self.require_accessible(caller, category_id)?;
        let current = ExpandedCategory::new(
            category,
            self.category_items
                .list_expanded_for_category(category_id)?,
        );
        self.categories
            .set_category_packed(category_id, !current.packed)?;

        let category = self.require_category(category_id)?;
        let items = self
            .category_items
            .list_expanded_for_category(category_id)?;
        Ok(ExpandedCategory::new(category, items))
    }

    /// Copies one category with unpacked items to the end of `list_id`.
    pub fn copy_to_list(
        &self,
        caller: UserId,
        category_id: CategoryId,
        list_id: ListId,
    ) -> ServiceResult<Category> {
        self.require_accessible(caller, category_id)?;
        self.require_list_access(caller, list_id)?;
        let copy_id = self.categories.copy_category_to_list(category_id, list_id)?;
        self.require_category(copy_id)
    }

    /// Categories from the caller's other lists, offered for copying.
    pub fn from_other_lists(
        &self,
        caller: UserId,
        list_id: ListId,
    ) -> ServiceResult<Vec<OtherCategory>> {
        self.require_list_access(caller, list_id)?;
        Ok(self.categories.categories_from_other_lists(caller, list_id)?)
    }

    fn require_category(&self, category_id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get_category(category_id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::Category,
                id: category_id,
            })
    }

    fn require_accessible(&self, caller: UserId, category_id: CategoryId) -> ServiceResult<Category> {
        let category = self.require_category(category_id)?;
        ensure_list_access(
            &self.access,
            category.list_id,
            caller,
            EntityKind::Category,
            category_id,
        )?;
        Ok(category)
    }

    fn require_list_access(&self, caller: UserId, list_id: ListId) -> ServiceResult<()> {
        if self.lists.get_list(list_id)?.is_none() {
            return Err(ServiceError::NotFound {
                kind: EntityKind::List,
                id: list_id,
            });
        }
        ensure_list_access(&self.access, list_id, caller, EntityKind::List, list_id)
    }
}
