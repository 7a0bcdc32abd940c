//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist categories of one list and their bulk packed state.
//! - Copy categories across lists.
//!
//! # Invariants
//! - New categories are appended after the list's last category.
//! - A copied category never duplicates an item already present in the
//!   target list; copied rows start unpacked.

use crate::model::category::{Category, CategoryId, OtherCategory};
use crate::model::list::ListId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::ordering_store::{child_ids, next_child_position, ChildTable};
use crate::repo::{bool_to_int, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    list_id,
    name,
    sort_order,
    created_at,
    updated_at
FROM categories";

/// Repository interface for category operations.
pub trait CategoryRepository {
    /// Creates one category at the end of `list_id`.
    fn create_category(&self, list_id: ListId, name: &str) -> RepoResult<Category>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists categories of one list in position order.
    fn list_categories(&self, list_id: ListId) -> RepoResult<Vec<Category>>;
    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<()>;
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
    /// Sets `packed` on every item of one category; returns rows changed.
    fn set_category_packed(&self, id: CategoryId, packed: bool) -> RepoResult<usize>;
    /// Categories from `user`'s visible lists other than `excluded_list`.
    fn categories_from_other_lists(
        &self,
        user: UserId,
        excluded_list: ListId,
    ) -> RepoResult<Vec<OtherCategory>>;
    /// Copies one category with its items to the end of `target_list`.
    fn copy_category_to_list(
        &self,
        id: CategoryId,
        target_list: ListId,
    ) -> RepoResult<CategoryId>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["categories", "category_items", "lists"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, list_id: ListId, name: &str) -> RepoResult<Category> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_child_position(&tx, ChildTable::Categories, list_id)?;
        tx.execute(
            "INSERT INTO categories (id, list_id, name, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), list_id.to_string(), name, sort_order],
        )?;
        tx.commit()?;
        required_category(self.conn, id)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        load_category(self.conn, id)
    }

    fn list_categories(&self, list_id: ListId) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE list_id = ?1
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE categories
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(category_not_found(id));
        }
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(category_not_found(id));
        }
        Ok(())
    }

    fn set_category_packed(&self, id: CategoryId, packed: bool) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE category_items
             SET packed = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE category_id = ?1;",
            params![id.to_string(), bool_to_int(packed)],
        )?;
        Ok(changed)
    }

    fn categories_from_other_lists(
        &self,
        user: UserId,
        excluded_list: ListId,
    ) -> RepoResult<Vec<OtherCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, l.id, l.name
             FROM categories c
             INNER JOIN lists l ON l.id = c.list_id
             INNER JOIN list_users lu ON lu.list_id = l.id
             WHERE lu.user_id = ?1
               AND lu.is_pending = 0
               AND c.list_id <> ?2
             ORDER BY l.sort_order DESC, c.sort_order DESC, c.id ASC;",
        )?;
        let mut rows = stmt.query(params![user.to_string(), excluded_list.to_string()])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            let list_id_text: String = row.get(2)?;
            categories.push(OtherCategory {
                id: parse_uuid(&id_text, "categories.id")?,
                name: row.get(1)?,
                list_id: parse_uuid(&list_id_text, "lists.id")?,
                list_name: row.get(3)?,
            });
        }
        Ok(categories)
    }

    fn copy_category_to_list(
        &self,
        id: CategoryId,
        target_list: ListId,
    ) -> RepoResult<CategoryId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let source = load_category(&tx, id)?.ok_or_else(|| category_not_found(id))?;

        let new_category_id = Uuid::new_v4();
        let sort_order = next_child_position(&tx, ChildTable::Categories, target_list)?;
        tx.execute(
            "INSERT INTO categories (id, list_id, name, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                new_category_id.to_string(),
                target_list.to_string(),
                source.name,
                sort_order,
            ],
        )?;

        let mut copied = 0i64;
        for category_item_id in child_ids(&tx, ChildTable::CategoryItems, id)? {
            // Skips items the target list already holds in any category.
            let changed = tx.execute(
                "INSERT INTO category_items (id, category_id, item_id, packed, quantity, sort_order)
                 SELECT ?2, ?3, ci.item_id, 0, ci.quantity, ?4
                 FROM category_items ci
                 WHERE ci.id = ?1
                   AND NOT EXISTS (
                     SELECT 1
                     FROM category_items existing
                     INNER JOIN categories c ON c.id = existing.category_id
                     WHERE c.list_id = ?5
                       AND existing.item_id = ci.item_id
                   );",
                params![
                    category_item_id.to_string(),
                    Uuid::new_v4().to_string(),
                    new_category_id.to_string(),
                    copied,
                    target_list.to_string(),
                ],
            )?;
            copied += changed as i64;
        }
        tx.commit()?;

        info!(
            "event=category_copy module=repo status=ok source_id={} category_id={} list_id={} category_items={}",
            id, new_category_id, target_list, copied
        );
        Ok(new_category_id)
    }
}

/// Loads one category by id.
pub(crate) fn load_category(conn: &Connection, id: CategoryId) -> RepoResult<Option<Category>> {
    let category = conn
        .query_row(
            &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_category_row(row)),
        )
        .optional()?;
    category.transpose()
}

fn required_category(conn: &Connection, id: CategoryId) -> RepoResult<Category> {
    load_category(conn, id)?.ok_or_else(|| category_not_found(id))
}

fn category_not_found(id: CategoryId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::Category,
        id,
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id_text: String = row.get("id")?;
    let list_id_text: String = row.get("list_id")?;
    Ok(Category {
        id: parse_uuid(&id_text, "categories.id")?,
        list_id: parse_uuid(&list_id_text, "categories.list_id")?,
        name: row.get("name")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
