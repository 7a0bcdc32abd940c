//! Gear library repository.
//!
//! Items are owned by exactly one user; deleting an item cascades to every
//! category placement that references it.

use crate::model::item::{Item, ItemId, ItemPatch, NewItem, WeightUnit};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    description,
    weight,
    weight_unit,
    created_at,
    updated_at
FROM items";

pub trait ItemRepository {
    fn create_item(&self, owner: UserId, input: &NewItem) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Lists `owner`'s items, newest first.
    fn list_items_for_user(&self, owner: UserId) -> RepoResult<Vec<Item>>;
    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<()>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["items"])?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, owner: UserId, input: &NewItem) -> RepoResult<Item> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO items (id, user_id, name, description, weight, weight_unit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                owner.to_string(),
                input.name,
                input.description,
                input.weight,
                input.weight_unit.as_str(),
            ],
        )?;
        self.get_item(id)?.ok_or_else(|| item_not_found(id))
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_item_row(row)),
            )
            .optional()?;
        item.transpose()
    }

    fn list_items_for_user(&self, owner: UserId) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET name = COALESCE(?2, name),
                 description = COALESCE(?3, description),
                 weight = COALESCE(?4, weight),
                 weight_unit = COALESCE(?5, weight_unit),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                patch.name,
                patch.description,
                patch.weight,
                patch.weight_unit.map(WeightUnit::as_str),
            ],
        )?;
        if changed == 0 {
            return Err(item_not_found(id));
        }
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(item_not_found(id));
        }
        Ok(())
    }
}

pub(crate) fn parse_weight_unit(value: &str) -> RepoResult<WeightUnit> {
    WeightUnit::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid weight unit `{value}` in items")))
}

fn item_not_found(id: ItemId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::Item,
        id,
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("id")?;
    let user_id_text: String = row.get("user_id")?;
    let unit_text: String = row.get("weight_unit")?;
    Ok(Item {
        id: parse_uuid(&id_text, "items.id")?,
        user_id: parse_uuid(&user_id_text, "items.user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        weight: row.get("weight")?,
        weight_unit: parse_weight_unit(&unit_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
