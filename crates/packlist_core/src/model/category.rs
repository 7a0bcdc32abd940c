//! Category and category-item records.
//!
//! # Invariants
//! - Categories are ordered within their parent list.
//! - Category items are ordered within their parent category.
//! - `quantity` is at least 1.

use crate::model::item::{Item, ItemId};
use crate::model::list::ListId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;
pub type CategoryItemId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub list_id: ListId,
    pub name: String,
    /// Position among categories of the same list.
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Placement of one library item inside one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub id: CategoryItemId,
    pub category_id: CategoryId,
    pub item_id: ItemId,
    pub packed: bool,
    pub quantity: i64,
    /// Position among items of the same category.
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial category update. `sort_order` triggers a reorder within the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

/// Partial category-item update.
///
/// A changed `category_id` appends the row to the destination category
/// before `sort_order` (if any) is applied there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryItemPatch {
    pub packed: Option<bool>,
    pub quantity: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedCategoryItem {
    #[serde(flatten)]
    pub category_item: CategoryItem,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedCategory {
    #[serde(flatten)]
    pub category: Category,
    pub items: Vec<ExpandedCategoryItem>,
    /// True when the category has items and all of them are packed.
    pub packed: bool,
}

impl ExpandedCategory {
    pub fn new(category: Category, items: Vec<ExpandedCategoryItem>) -> Self {
        let packed = !items.is_empty() && items.iter().all(|entry| entry.category_item.packed);
        Self {
            category,
            items,
            packed,
        }
    }
}

/// Category offered for copying from another of the caller's lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherCategory {
    pub id: CategoryId,
    pub name: String,
    pub list_id: ListId,
    pub list_name: String,
}
