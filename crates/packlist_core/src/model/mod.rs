//! Packing-list domain model.
//!
//! # Responsibility
//! - Define canonical records used by core business logic.
//! - Hold field-level validation that does not need storage access.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4 id.
//! - `sort_order` is the only ordering key; it is dense within a sibling set
//!   after each successful move.

pub mod category;
pub mod feedback;
pub mod item;
pub mod list;
pub mod user;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Entity kinds that participate in position-ordered collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    List,
    Category,
    CategoryItem,
    Item,
    User,
}

impl EntityKind {
    /// Stable identifier used in log events and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Category => "category",
            Self::CategoryItem => "category_item",
            Self::Item => "item",
            Self::User => "user",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
