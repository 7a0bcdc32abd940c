//! Packing list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist lists and their membership rows.
//! - Provide list-graph bulk operations (unpack, duplicate).
//!
//! # Invariants
//! - A user's visible lists are those with a non-pending membership.
//! - List creation records the creator as admin, non-pending member in the
//!   same transaction.
//! - Duplication copies categories and category items in their current
//!   relative order and assigns dense positions to the copies.

use crate::model::list::{ListId, ListMember, NewList, PackingList};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::SiblingPosition;
use crate::repo::ordering_store::{child_ids, ChildTable};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    l.id AS id,
    l.name AS name,
    l.description AS description,
    l.sort_order AS sort_order,
    l.created_at AS created_at,
    l.updated_at AS updated_at
FROM lists l";

/// Repository interface for list and membership operations.
pub trait ListRepository {
    /// Creates one list at the end of `owner`'s visible lists.
    fn create_list(&self, owner: UserId, input: &NewList) -> RepoResult<PackingList>;
    fn get_list(&self, id: ListId) -> RepoResult<Option<PackingList>>;
    /// Lists `user`'s visible lists in position order.
    fn list_for_user(&self, user: UserId) -> RepoResult<Vec<PackingList>>;
    /// Updates non-position fields; `None` leaves a field unchanged.
    fn update_list_fields(
        &self,
        id: ListId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<()>;
    fn delete_list(&self, id: ListId) -> RepoResult<()>;
    fn get_member(&self, list_id: ListId, user_id: UserId) -> RepoResult<Option<ListMember>>;
    /// Inserts or replaces one membership row.
    fn upsert_member(&self, member: &ListMember) -> RepoResult<()>;
    /// Turns a pending membership into an active one.
    fn accept_membership(&self, list_id: ListId, user_id: UserId) -> RepoResult<()>;
    /// Marks every category item of the list unpacked; returns rows changed.
    fn unpack_list(&self, id: ListId) -> RepoResult<usize>;
    /// Copies one list graph for `owner`; returns the new list id.
    fn duplicate_list(&self, id: ListId, owner: UserId) -> RepoResult<ListId>;
}

/// SQLite-backed list repository.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["lists", "list_users", "categories", "category_items"],
        )?;
        Ok(Self { conn })
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn create_list(&self, owner: UserId, input: &NewList) -> RepoResult<PackingList> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = insert_list_for_owner(&tx, owner, &input.name, &input.description)?;
        tx.commit()?;
        required_list(self.conn, id)
    }

    fn get_list(&self, id: ListId) -> RepoResult<Option<PackingList>> {
        load_list(self.conn, id)
    }

    fn list_for_user(&self, user: UserId) -> RepoResult<Vec<PackingList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             INNER JOIN list_users lu ON lu.list_id = l.id
             WHERE lu.user_id = ?1
               AND lu.is_pending = 0
             ORDER BY l.sort_order ASC, l.id ASC;"
        ))?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }

    fn update_list_fields(
        &self,
        id: ListId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE lists
             SET name = COALESCE(?2, name),
                 description = COALESCE(?3, description),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name, description],
        )?;
        if changed == 0 {
            return Err(list_not_found(id));
        }
        Ok(())
    }

    fn delete_list(&self, id: ListId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM lists WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(list_not_found(id));
        }
        Ok(())
    }

    fn get_member(&self, list_id: ListId, user_id: UserId) -> RepoResult<Option<ListMember>> {
        let flags: Option<(i64, i64)> = self
            .conn
            .query_row(
                "SELECT is_admin, is_pending
                 FROM list_users
                 WHERE list_id = ?1
                   AND user_id = ?2;",
                params![list_id.to_string(), user_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        flags
            .map(|(is_admin, is_pending)| {
                Ok(ListMember {
                    list_id,
                    user_id,
                    is_admin: parse_bool(is_admin, "list_users.is_admin")?,
                    is_pending: parse_bool(is_pending, "list_users.is_pending")?,
                })
            })
            .transpose()
    }

    fn upsert_member(&self, member: &ListMember) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO list_users (list_id, user_id, is_admin, is_pending)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (list_id, user_id) DO UPDATE
             SET is_admin = excluded.is_admin,
                 is_pending = excluded.is_pending;",
            params![
                member.list_id.to_string(),
                member.user_id.to_string(),
                bool_to_int(member.is_admin),
                bool_to_int(member.is_pending),
            ],
        )?;
        Ok(())
    }

    fn accept_membership(&self, list_id: ListId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE list_users
             SET is_pending = 0
             WHERE list_id = ?1
               AND user_id = ?2;",
            params![list_id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(list_not_found(list_id));
        }
        Ok(())
    }

    fn unpack_list(&self, id: ListId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE category_items
             SET packed = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE packed = 1
               AND category_id IN (SELECT id FROM categories WHERE list_id = ?1);",
            [id.to_string()],
        )?;
        Ok(changed)
    }

    fn duplicate_list(&self, id: ListId, owner: UserId) -> RepoResult<ListId> {
        let source = required_list(self.conn, id)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let copy_name = format!("{} (Copy)", source.name);
        let new_list_id = insert_list_for_owner(&tx, owner, &copy_name, &source.description)?;

        let category_ids = child_ids(&tx, ChildTable::Categories, id)?;
        let mut copied_items = 0usize;
        for (category_position, category_id) in category_ids.iter().enumerate() {
            let new_category_id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO categories (id, list_id, name, sort_order)
                 SELECT ?2, ?3, name, ?4
                 FROM categories
                 WHERE id = ?1;",
                params![
                    category_id.to_string(),
                    new_category_id.to_string(),
                    new_list_id.to_string(),
                    category_position as i64,
                ],
            )?;

            let item_ids = child_ids(&tx, ChildTable::CategoryItems, *category_id)?;
            for (item_position, category_item_id) in item_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO category_items (id, category_id, item_id, packed, quantity, sort_order)
                     SELECT ?2, ?3, item_id, packed, quantity, ?4
                     FROM category_items
                     WHERE id = ?1;",
                    params![
                        category_item_id.to_string(),
                        Uuid::new_v4().to_string(),
                        new_category_id.to_string(),
                        item_position as i64,
                    ],
                )?;
            }
            copied_items += item_ids.len();
        }
        tx.commit()?;

        info!(
            "event=list_duplicate module=repo status=ok source_id={} list_id={} categories={} category_items={}",
            id,
            new_list_id,
            category_ids.len(),
            copied_items
        );
        Ok(new_list_id)
    }
}

/// Loads one list by id.
pub(crate) fn load_list(conn: &Connection, id: ListId) -> RepoResult<Option<PackingList>> {
    let list = conn
        .query_row(
            &format!("{LIST_SELECT_SQL} WHERE l.id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_list_row(row)),
        )
        .optional()?;
    list.transpose()
}

/// Loads `user`'s visible list ids with their stored positions, in order.
pub(crate) fn visible_list_positions(
    conn: &Connection,
    user: UserId,
) -> RepoResult<Vec<SiblingPosition>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.sort_order
         FROM lists l
         INNER JOIN list_users lu ON lu.list_id = l.id
         WHERE lu.user_id = ?1
           AND lu.is_pending = 0
         ORDER BY l.sort_order ASC, l.id ASC;",
    )?;
    let mut rows = stmt.query([user.to_string()])?;
    let mut siblings = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        siblings.push(SiblingPosition {
            id: parse_uuid(&id_text, "lists.id")?,
            position: row.get(1)?,
        });
    }
    Ok(siblings)
}

fn required_list(conn: &Connection, id: ListId) -> RepoResult<PackingList> {
    load_list(conn, id)?.ok_or_else(|| list_not_found(id))
}

fn list_not_found(id: ListId) -> RepoError {
    RepoError::NotFound {
        kind: EntityKind::List,
        id,
    }
}

fn insert_list_for_owner(
    conn: &Connection,
    owner: UserId,
    name: &str,
    description: &str,
) -> RepoResult<ListId> {
    let id = Uuid::new_v4();
    let sort_order = next_visible_list_position(conn, owner)?;
    conn.execute(
        "INSERT INTO lists (id, name, description, sort_order)
         VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), name, description, sort_order],
    )?;
    conn.execute(
        "INSERT INTO list_users (list_id, user_id, is_admin, is_pending)
         VALUES (?1, ?2, 1, 0);",
        params![id.to_string(), owner.to_string()],
    )?;
    Ok(id)
}

fn next_visible_list_position(conn: &Connection, user: UserId) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(l.sort_order), -1) + 1
         FROM lists l
         INNER JOIN list_users lu ON lu.list_id = l.id
         WHERE lu.user_id = ?1
           AND lu.is_pending = 0;",
        [user.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<PackingList> {
    let id_text: String = row.get("id")?;
    Ok(PackingList {
        id: parse_uuid(&id_text, "lists.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
