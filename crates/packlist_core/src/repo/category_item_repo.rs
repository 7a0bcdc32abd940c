//! Category item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist item placements inside categories.
//! - Build ordered read models joined with the gear library.
//!
//! # Invariants
//! - New placements and reparented placements are appended after the
//!   destination category's last item.
//! - One library item appears at most once per list; callers check
//!   `list_contains_item` before inserting.

use crate::model::category::{
    CategoryId, CategoryItem, CategoryItemId, ExpandedCategoryItem,
};
use crate::model::item::{Item, ItemId};
use crate::model::list::ListId;
use crate::model::EntityKind;
use crate::repo::item_repo::parse_weight_unit;
use crate::repo::ordering_store::{next_child_position, ChildTable};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const CATEGORY_ITEM_SELECT_SQL: &str = "SELECT
    id,
    category_id,
    item_id,
    packed,
    quantity,
    sort_order,
    created_at,
    updated_at
FROM category_items";

pub trait CategoryItemRepository {
    /// Appends `item_id` to the end of `category_id`.
    fn create_category_item(
        &self,
        category_id: CategoryId,
        item_id: ItemId,
    ) -> RepoResult<CategoryItem>;
    fn get_category_item(&self, id: CategoryItemId) -> RepoResult<Option<CategoryItem>>;
    /// Lists one category's placements joined with their items, in order.
    fn list_expanded_for_category(
        &self,
        category_id: CategoryId,
    ) -> RepoResult<Vec<ExpandedCategoryItem>>;
    /// Updates non-position fields; `None` leaves a field unchanged.
    fn update_category_item_fields(
        &self,
        id: CategoryItemId,
        packed: Option<bool>,
        quantity: Option<i64>,
    ) -> RepoResult<()>;
    /// Moves one placement to the end of `category_id`.
    fn reparent_category_item(
        &self,
        id: CategoryItemId,
        category_id: CategoryId,
    ) -> RepoResult<()>;
    /// Deletes one placement and returns the removed row.
    fn delete_category_item(&self, id: CategoryItemId) -> RepoResult<CategoryItem>;
    /// Whether any category of `list_id` already holds `item_id`.
    fn list_contains_item(&self, list_id: ListId, item_id: ItemId) -> RepoResult<bool>;
    /// Number of placements referencing `item_id` across all lists.
    fn count_placements(&self, item_id: ItemId) -> RepoResult<usize>;
}

/// SQLite-backed category item repository.
pub struct SqliteCategoryItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryItemRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["category_items", "categories", "items"])?;
        Ok(Self { conn })
    }
}

impl CategoryItemRepository for SqliteCategoryItemRepository<'_> {
    fn create_category_item(
        &self,
        category_id: CategoryId,
        item_id: ItemId,
    ) -> RepoResult<CategoryItem> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_child_position(&tx, ChildTable::CategoryItems, category_id)?;
        tx.execute(
            "INSERT INTO category_items (id, category_id, item_id, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                category_id.to_string(),
                item_id.to_string(),
                sort_order
            ],
        )?;
        tx.commit()?;
        load_category_item(self.conn, id)?.ok_or_else(|| category_item_not_found(id))
    }

    fn get_category_item(&self, id: CategoryItemId) -> RepoResult<Option<CategoryItem>> {
        load_category_item(self.conn, id)
    }

    fn list_expanded_for_category(
        &self,
        category_id: CategoryId,
    ) -> RepoResult<Vec<ExpandedCategoryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                ci.id AS id,
                ci.category_id AS category_id,
                ci.item_id AS item_id,
                ci.packed AS packed,
                ci.quantity AS quantity,
                ci.sort_order AS sort_order,
                ci.created_at AS created_at,
                ci.updated_at AS updated_at,
                i.user_id AS item_user_id,
                i.name AS item_name,
                i.description AS item_description,
                i.weight AS item_weight,
                i.weight_unit AS item_weight_unit,
                i.created_at AS item_created_at,
                i.updated_at AS item_updated_at
             FROM category_items ci
             INNER JOIN items i ON i.id = ci.item_id
             WHERE ci.category_id = ?1
             ORDER BY ci.sort_order ASC, ci.id ASC;",
        )?;
        let mut rows = stmt.query([category_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let category_item = parse_category_item_row(row)?;
            let user_id_text: String = row.get("item_user_id")?;
            let unit_text: String = row.get("item_weight_unit")?;
            let item = Item {
                id: category_item.item_id,
                user_id: parse_uuid(&user_id_text, "items.user_id")?,
                name: row.get("item_name")?,
                description: row.get("item_description")?,
                weight: row.get("item_weight")?,
                weight_unit: parse_weight_unit(&unit_text)?,
                created_at: row.get("item_created_at")?,
                updated_at: row.get("item_updated_at")?,
            };
            entries.push(ExpandedCategoryItem {
                category_item,
                item,
            });
        }
        Ok(entries)
    }

    fn update_category_item_fields(
        &self,
        id: CategoryItemId,
        packed: Option<bool>,
        quantity: Option<i64>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE category_items
             SET packed = COALESCE(?2, packed),
                 quantity = COALESCE(?3, quantity),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), packed.map(bool_to_int), quantity],
        )?;
        if changed == 0 {
            return Err(category_item_not_found(id));
        }
        Ok(())
    }

    fn reparent_category_item(
        &self,
        id: CategoryItemId,
        category_id: CategoryId,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_child_position(&tx, ChildTable::CategoryItems, category_id)?;
        let changed = tx.execute(
            "UPDATE category_items
             SET category_id = ?2,
                 sort_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), category_id.to_string(), sort_order],
        )?;
        if changed == 0 {
            return Err(category_item_not_found(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_category_item(&self, id: CategoryItemId) -> RepoResult<CategoryItem> {
        let existing =
            load_category_item(self.conn, id)?.ok_or_else(|| category_item_not_found(id))?;
        self.conn
            .execute("DELETE FROM category_items WHERE id = ?1;", [id.to_string()])?;
        Ok(existing)
    }

    fn list_contains_item(&self, list_id: ListId, item_id: ItemId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM category_items ci
                INNER JOIN categories c ON c.id = ci.category_id
                WHERE c.list_id = ?1
                  AND ci.item_id = ?2
            );",
            params![list_id.to_string(), item_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count_placements(&self, item_id: ItemId) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM category_items WHERE item_id = ?1;",
            [item_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Loads one category item by id.
pub(crate) fn load_category_item(
    conn: &Connection,
    id: CategoryItemId,
) -> RepoResult<Option<CategoryItem>> {
    let category_item = conn
        .query_row(
            &format!("{CATEGORY_ITEM_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_category_item_row(row)),
        )
        .optional()?;
    category_item.transpose()
}

fn category_item_not_found(id: CategoryItemId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::CategoryItem,
        id,
    }
}

fn parse_category_item_row(row: &Row<'_>) -> RepoResult<CategoryItem> {
    let id_text: String = row.get("id")?;
    let category_id_text: String = row.get("category_id")?;
    let item_id_text: String = row.get("item_id")?;
    let packed: i64 = row.get("packed")?;
    Ok(CategoryItem {
        id: parse_uuid(&id_text, "category_items.id")?,
        category_id: parse_uuid(&category_id_text, "category_items.category_id")?,
        item_id: parse_uuid(&item_id_text, "category_items.item_id")?,
        packed: parse_bool(packed, "category_items.packed")?,
        quantity: row.get("quantity")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
