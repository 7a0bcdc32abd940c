//! SQLite scope resolvers and access policy for the reordering engine.
//!
//! # Responsibility
//! - Define the three sibling scopes: a user's visible lists, a list's
//!   categories, a category's items.
//! - Load sibling positions and write full position rewrites.
//!
//! # Invariants
//! - Sibling loads order by `sort_order ASC, id ASC` only; they never assume
//!   the stored integers are dense.
//! - One rewrite runs in one IMMEDIATE transaction, so a committed rewrite is
//!   always dense for the ids it received.
//! - Each UPDATE re-checks scope membership; rows that left the scope since
//!   the load are skipped with a warning.
//! - `lists.sort_order` is one column shared by every member of a list. A
//!   move renumbers only the mover's visible lists, so another member's view
//!   may show gaps or ties until that member moves a list; the
//!   `sort_order, id` tie-break keeps that view deterministic meanwhile.

use crate::model::category::{Category, CategoryId, CategoryItem};
use crate::model::list::{ListId, PackingList};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::ordering::{AccessPolicy, ScopeBinding, ScopeResolver, SiblingPosition};
use crate::repo::category_item_repo::load_category_item;
use crate::repo::category_repo::load_category;
use crate::repo::list_repo::{load_list, visible_list_positions};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Orderable child tables keyed by one parent id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildTable {
    Categories,
    CategoryItems,
}

impl ChildTable {
    fn table(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::CategoryItems => "category_items",
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            Self::Categories => "list_id",
            Self::CategoryItems => "category_id",
        }
    }
}

/// Loads one parent's children with stored positions, in position order.
pub(crate) fn child_positions(
    conn: &Connection,
    child: ChildTable,
    parent_id: Uuid,
) -> RepoResult<Vec<SiblingPosition>> {
    let table = child.table();
    let mut stmt = conn.prepare(&format!(
        "SELECT id, sort_order
         FROM {table}
         WHERE {parent} = ?1
         ORDER BY sort_order ASC, id ASC;",
        parent = child.parent_column(),
    ))?;
    let mut rows = stmt.query([parent_id.to_string()])?;
    let mut siblings = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        siblings.push(SiblingPosition {
            id: parse_uuid(&id_text, table)?,
            position: row.get(1)?,
        });
    }
    Ok(siblings)
}

/// Loads one parent's child ids in position order.
pub(crate) fn child_ids(
    conn: &Connection,
    child: ChildTable,
    parent_id: Uuid,
) -> RepoResult<Vec<Uuid>> {
    Ok(child_positions(conn, child, parent_id)?
        .into_iter()
        .map(|sibling| sibling.id)
        .collect())
}

/// Position for a new child appended at the end (`MAX + 1`, or 0).
pub(crate) fn next_child_position(
    conn: &Connection,
    child: ChildTable,
    parent_id: Uuid,
) -> RepoResult<i64> {
    let next = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM {table}
             WHERE {parent} = ?1;",
            table = child.table(),
            parent = child.parent_column(),
        ),
        [parent_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Runs `update_sql` (`?1` id, `?2` position, `?3` scope) for every id.
fn rewrite_positions(
    conn: &Connection,
    kind: EntityKind,
    update_sql: &str,
    scope_param: String,
    ordered_ids: &[Uuid],
) -> RepoResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let mut written = 0usize;
    {
        let mut stmt = tx.prepare(update_sql)?;
        for (index, id) in ordered_ids.iter().enumerate() {
            let changed = stmt.execute(params![id.to_string(), index as i64, scope_param])?;
            if changed == 0 {
                warn!(
                    "event=position_write_skipped module=ordering status=ok kind={} id={} position={}",
                    kind, id, index
                );
                continue;
            }
            written += changed;
        }
    }
    tx.commit()?;
    Ok(written)
}

/// Sibling set of the list scope: every list visible to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListScope {
    pub user_id: UserId,
}

/// Sibling set of the category scope: categories of one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScope {
    pub list_id: ListId,
}

/// Sibling set of the category-item scope: items of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryItemScope {
    pub category_id: CategoryId,
}

/// Orders lists inside the caller's visible collection.
pub struct ListScopeResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ListScopeResolver<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["lists", "list_users"])?;
        Ok(Self { conn })
    }
}

impl ScopeResolver for ListScopeResolver<'_> {
    type Scope = ListScope;
    type Entity = PackingList;

    fn kind(&self) -> EntityKind {
        EntityKind::List
    }

    fn resolve_scope(
        &self,
        caller: UserId,
        entity_id: Uuid,
    ) -> RepoResult<Option<ScopeBinding<ListScope>>> {
        // The scope is derived from the caller, not stored on the row.
        Ok(load_list(self.conn, entity_id)?.map(|list| ScopeBinding {
            scope: ListScope { user_id: caller },
            access_list: list.id,
        }))
    }

    fn load_siblings_ordered(&self, scope: &ListScope) -> RepoResult<Vec<SiblingPosition>> {
        visible_list_positions(self.conn, scope.user_id)
    }

    fn persist_positions(&self, scope: &ListScope, ordered_ids: &[Uuid]) -> RepoResult<usize> {
        rewrite_positions(
            self.conn,
            EntityKind::List,
            "UPDATE lists
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND EXISTS (
                 SELECT 1
                 FROM list_users
                 WHERE list_users.list_id = lists.id
                   AND list_users.user_id = ?3
                   AND list_users.is_pending = 0
               );",
            scope.user_id.to_string(),
            ordered_ids,
        )
    }

    fn load_entity(&self, entity_id: Uuid) -> RepoResult<Option<PackingList>> {
        load_list(self.conn, entity_id)
    }
}

/// Orders categories inside their parent list.
pub struct CategoryScopeResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CategoryScopeResolver<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["categories"])?;
        Ok(Self { conn })
    }
}

impl ScopeResolver for CategoryScopeResolver<'_> {
    type Scope = CategoryScope;
    type Entity = Category;

    fn kind(&self) -> EntityKind {
        EntityKind::Category
    }

    fn resolve_scope(
        &self,
        _caller: UserId,
        entity_id: Uuid,
    ) -> RepoResult<Option<ScopeBinding<CategoryScope>>> {
        let list_id: Option<String> = self
            .conn
            .query_row(
                "SELECT list_id FROM categories WHERE id = ?1;",
                [entity_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        list_id
            .map(|value| {
                let list_id = parse_uuid(&value, "categories.list_id")?;
                Ok(ScopeBinding {
                    scope: CategoryScope { list_id },
                    access_list: list_id,
                })
            })
            .transpose()
    }

    fn load_siblings_ordered(&self, scope: &CategoryScope) -> RepoResult<Vec<SiblingPosition>> {
        child_positions(self.conn, ChildTable::Categories, scope.list_id)
    }

    fn persist_positions(&self, scope: &CategoryScope, ordered_ids: &[Uuid]) -> RepoResult<usize> {
        rewrite_positions(
            self.conn,
            EntityKind::Category,
            "UPDATE categories
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND list_id = ?3;",
            scope.list_id.to_string(),
            ordered_ids,
        )
    }

    fn load_entity(&self, entity_id: Uuid) -> RepoResult<Option<Category>> {
        load_category(self.conn, entity_id)
    }
}

/// Orders category items inside their parent category.
pub struct CategoryItemScopeResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CategoryItemScopeResolver<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["categories", "category_items"])?;
        Ok(Self { conn })
    }
}

impl ScopeResolver for CategoryItemScopeResolver<'_> {
    type Scope = CategoryItemScope;
    type Entity = CategoryItem;

    fn kind(&self) -> EntityKind {
        EntityKind::CategoryItem
    }

    fn resolve_scope(
        &self,
        _caller: UserId,
        entity_id: Uuid,
    ) -> RepoResult<Option<ScopeBinding<CategoryItemScope>>> {
        let parents: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT ci.category_id, c.list_id
                 FROM category_items ci
                 INNER JOIN categories c ON c.id = ci.category_id
                 WHERE ci.id = ?1;",
                [entity_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        parents
            .map(|(category_id, list_id)| {
                Ok(ScopeBinding {
                    scope: CategoryItemScope {
                        category_id: parse_uuid(&category_id, "category_items.category_id")?,
                    },
                    access_list: parse_uuid(&list_id, "categories.list_id")?,
                })
            })
            .transpose()
    }

    fn load_siblings_ordered(
        &self,
        scope: &CategoryItemScope,
    ) -> RepoResult<Vec<SiblingPosition>> {
        child_positions(self.conn, ChildTable::CategoryItems, scope.category_id)
    }

    fn persist_positions(
        &self,
        scope: &CategoryItemScope,
        ordered_ids: &[Uuid],
    ) -> RepoResult<usize> {
        rewrite_positions(
            self.conn,
            EntityKind::CategoryItem,
            "UPDATE category_items
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND category_id = ?3;",
            scope.category_id.to_string(),
            ordered_ids,
        )
    }

    fn load_entity(&self, entity_id: Uuid) -> RepoResult<Option<CategoryItem>> {
        load_category_item(self.conn, entity_id)
    }
}

/// Grants modify access to non-pending members of a list.
#[derive(Clone, Copy)]
pub struct SqliteAccessPolicy<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccessPolicy<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["list_users"])?;
        Ok(Self { conn })
    }
}

impl AccessPolicy for SqliteAccessPolicy<'_> {
    fn can_modify_list(&self, list_id: ListId, caller: UserId) -> RepoResult<bool> {
        let granted: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM list_users
                WHERE list_id = ?1
                  AND user_id = ?2
                  AND is_pending = 0
            );",
            params![list_id.to_string(), caller.to_string()],
            |row| row.get(0),
        )?;
        Ok(granted == 1)
    }
}
