//! Category item use-case service.
//!
//! # Responsibility
//! - Place library items into categories, edit, move, and remove them.
//!
//! # Invariants
//! - One library item is placed at most once per list (`Conflict`).
//! - Only the item's owner may place it.
//! - Reparenting appends to the destination category first; a requested
//!   `sort_order` is then applied inside the destination.
//! - Removing the last placement of a blank item deletes the item too.

use crate::model::category::{
    Category, CategoryId, CategoryItem, CategoryItemId, CategoryItemPatch, ExpandedCategoryItem,
};
use crate::model::item::{Item, ItemId, NewItem};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::MoveCoordinator;
use crate::repo::category_item_repo::{CategoryItemRepository, SqliteCategoryItemRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::item_repo::{ItemRepository, SqliteItemRepository};
use crate::repo::ordering_store::{
    child_ids, CategoryItemScopeResolver, ChildTable, SqliteAccessPolicy,
};
use crate::service::{
    ensure_insert_position, ensure_list_access, ensure_move_position, ServiceError, ServiceResult,
};
use log::{info, warn};
use rusqlite::Connection;

/// Category item service facade.
pub struct CategoryItemService<'conn> {
    conn: &'conn Connection,
    categories: SqliteCategoryRepository<'conn>,
    category_items: SqliteCategoryItemRepository<'conn>,
    items: SqliteItemRepository<'conn>,
    access: SqliteAccessPolicy<'conn>,
    mover: MoveCoordinator<CategoryItemScopeResolver<'conn>, SqliteAccessPolicy<'conn>>,
}

impl<'conn> CategoryItemService<'conn> {
    /// Creates service from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        let access = SqliteAccessPolicy::try_new(conn)?;
        Ok(Self {
            conn,
            categories: SqliteCategoryRepository::try_new(conn)?,
            category_items: SqliteCategoryItemRepository::try_new(conn)?,
            items: SqliteItemRepository::try_new(conn)?,
            access,
            mover: MoveCoordinator::new(CategoryItemScopeResolver::try_new(conn)?, access),
        })
    }

    /// Places an existing library item into a category.
    ///
    /// Without `position` the item is appended; with one it is appended and
    /// then moved there. `position` may equal the current item count. A
    /// failed move removes the appended placement again.
    pub fn add(
        &self,
        caller: UserId,
        category_id: CategoryId,
        item_id: ItemId,
        position: Option<i64>,
    ) -> ServiceResult<CategoryItem> {
        let category = self.require_category_access(caller, category_id)?;
        let item = self.require_owned_item(caller, item_id)?;
        if self
            .category_items
            .list_contains_item(category.list_id, item.id)?
        {
            return Err(ServiceError::Conflict {
                kind: EntityKind::Item,
                id: item.id,
            });
        }
        if let Some(position) = position {
            let sibling_count = child_ids(self.conn, ChildTable::CategoryItems, category_id)?.len();
            ensure_insert_position(position, sibling_count)?;
        }

        let placed = self
            .category_items
            .create_category_item(category_id, item.id)?;
        match position {
            Some(target) if target != placed.sort_order => {
                match self.mover.move_entity(caller, placed.id, target) {
                    Ok(moved) => Ok(moved),
                    Err(err) => {
                        self.discard_placement(&placed)?;
                        Err(err.into())
                    }
                }
            }
            _ => Ok(placed),
        }
    }

    /// Creates a library item for the caller and appends it to a category.
    pub fn create_and_add(
        &self,
        caller: UserId,
        category_id: CategoryId,
        input: NewItem,
    ) -> ServiceResult<ExpandedCategoryItem> {
        input
            .validate()
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        self.require_category_access(caller, category_id)?;

        let item = self.items.create_item(caller, &input)?;
        let category_item = self
            .category_items
            .create_category_item(category_id, item.id)?;
        Ok(ExpandedCategoryItem {
            category_item,
            item,
        })
    }

    /// Edits packed/quantity, reparents, and/or moves one placement.
    ///
    /// Quantity, destination, and target position are all checked before the
    /// first write, so a rejected patch leaves the placement untouched.
    pub fn update(
        &self,
        caller: UserId,
        category_item_id: CategoryItemId,
        patch: CategoryItemPatch,
    ) -> ServiceResult<CategoryItem> {
        if let Some(quantity) = patch.quantity {
            if quantity < 1 {
                return Err(ServiceError::Validation(format!(
                    "quantity must be at least 1, got {quantity}"
                )));
            }
        }

        let current = self.require_accessible(caller, category_item_id)?;
        let destination_id = patch
            .category_id
            .filter(|destination_id| *destination_id != current.category_id);
        if let Some(destination_id) = destination_id {
            let source = self.require_category(current.category_id)?;
            let destination = self.require_category_access(caller, destination_id)?;
            if destination.list_id != source.list_id
                && self
                    .category_items
                    .list_contains_item(destination.list_id, current.item_id)?
            {
                return Err(ServiceError::Conflict {
                    kind: EntityKind::Item,
                    id: current.item_id,
                });
            }
        }
        if let Some(target) = patch.sort_order {
            match destination_id {
                // The reparent appends, so the destination gains one sibling.
                Some(destination_id) => {
                    let sibling_count =
                        child_ids(self.conn, ChildTable::CategoryItems, destination_id)?.len();
                    ensure_insert_position(target, sibling_count)?;
                }
                None => {
                    let sibling_count =
                        child_ids(self.conn, ChildTable::CategoryItems, current.category_id)?
                            .len();
                    ensure_move_position(target, sibling_count)?;
                }
            }
        }

        if patch.packed.is_some() || patch.quantity.is_some() {
            self.category_items.update_category_item_fields(
                category_item_id,
                patch.packed,
                patch.quantity,
            )?;
        }

        if let Some(destination_id) = destination_id {
            self.category_items
                .reparent_category_item(category_item_id, destination_id)?;
            info!(
                "event=category_item_reparent module=service status=ok id={} from={} to={}",
                category_item_id, current.category_id, destination_id
            );
        }

        match patch.sort_order {
            Some(target) => Ok(self.mover.move_entity(caller, category_item_id, target)?),
            None => self.require_category_item(category_item_id),
        }
    }

    /// Removes one placement; a blank item left without placements is
    /// deleted from the library as well.
    pub fn remove(
        &self,
        caller: UserId,
        category_item_id: CategoryItemId,
    ) -> ServiceResult<CategoryItem> {
        self.require_accessible(caller, category_item_id)?;
        let removed = self.category_items.delete_category_item(category_item_id)?;

        if let Some(item) = self.items.get_item(removed.item_id)? {
            if item.is_blank() && self.category_items.count_placements(item.id)? == 0 {
                self.items.delete_item(item.id)?;
                info!(
                    "event=blank_item_cleanup module=service status=ok item_id={}",
                    item.id
                );
            }
        }
        Ok(removed)
    }

    fn discard_placement(&self, placed: &CategoryItem) -> ServiceResult<()> {
        self.category_items.delete_category_item(placed.id)?;
        warn!(
            "event=category_item_add module=service status=error id={} category_id={} rolled_back=true",
            placed.id, placed.category_id
        );
        Ok(())
    }

    fn require_category(&self, category_id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get_category(category_id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::Category,
                id: category_id,
            })
    }

    fn require_category_access(
        &self,
        caller: UserId,
        category_id: CategoryId,
    ) -> ServiceResult<Category> {
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

    fn require_category_item(&self, id: CategoryItemId) -> ServiceResult<CategoryItem> {
        self.category_items
            .get_category_item(id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::CategoryItem,
                id,
            })
    }

    fn require_accessible(&self, caller: UserId, id: CategoryItemId) -> ServiceResult<CategoryItem> {
        let category_item = self.require_category_item(id)?;
        let category = self.require_category(category_item.category_id)?;
        ensure_list_access(
            &self.access,
            category.list_id,
            caller,
            EntityKind::CategoryItem,
            id,
        )?;
        Ok(category_item)
    }

    fn require_owned_item(&self, caller: UserId, item_id: ItemId) -> ServiceResult<Item> {
        let item = self.items.get_item(item_id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Item,
            id: item_id,
        })?;
        if item.user_id != caller {
            return Err(ServiceError::Forbidden {
                kind: EntityKind::Item,
                id: item_id,
            });
        }
        Ok(item)
    }
}
