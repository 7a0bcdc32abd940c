//! Packing list and membership records.
//!
//! # Invariants
//! - A list is visible to a user iff a non-pending membership row exists.
//! - `sort_order` orders lists inside each user's visible collection.

use crate::model::category::ExpandedCategory;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ListId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingList {
    pub id: ListId,
    pub name: String,
    pub description: String,
    /// Position inside the member's visible list collection.
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One user's membership in one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMember {
    pub list_id: ListId,
    pub user_id: UserId,
    /// Admins may invite further members.
    pub is_admin: bool,
    /// Pending members have been invited but cannot see the list yet.
    pub is_pending: bool,
}

/// Input for list creation. Missing fields default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub description: String,
}

/// Partial list update. `sort_order` triggers a reorder of the caller's lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
}

/// List with its categories and their items, all in position order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedList {
    #[serde(flatten)]
    pub list: PackingList,
    pub categories: Vec<ExpandedCategory>,
}
