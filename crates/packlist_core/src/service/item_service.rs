//! Gear library use-case service.
//!
//! Items are private to their owner: every read and write outside
//! `create` checks `item.user_id == caller`.

use crate::model::item::{Item, ItemId, ItemPatch, NewItem};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::item_repo::{ItemRepository, SqliteItemRepository};
use crate::service::{ServiceError, ServiceResult};
use rusqlite::Connection;

/// Item service facade.
pub struct ItemService<'conn> {
    items: SqliteItemRepository<'conn>,
}

impl<'conn> ItemService<'conn> {
    /// Creates service from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            items: SqliteItemRepository::try_new(conn)?,
        })
    }

    pub fn create(&self, caller: UserId, input: NewItem) -> ServiceResult<Item> {
        input
            .validate()
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        Ok(self.items.create_item(caller, &input)?)
    }

    pub fn list_for_user(&self, caller: UserId) -> ServiceResult<Vec<Item>> {
        Ok(self.items.list_items_for_user(caller)?)
    }

    pub fn update(&self, caller: UserId, item_id: ItemId, patch: ItemPatch) -> ServiceResult<Item> {
        patch
            .validate()
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        self.require_owned(caller, item_id)?;
        self.items.update_item(item_id, &patch)?;
        self.require_owned(caller, item_id)
    }

    /// Deletes one item and every placement of it.
    pub fn remove(&self, caller: UserId, item_id: ItemId) -> ServiceResult<()> {
        self.require_owned(caller, item_id)?;
        Ok(self.items.delete_item(item_id)?)
    }

    fn require_owned(&self, caller: UserId, item_id: ItemId) -> ServiceResult<Item> {
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
