//! Core domain logic for the packing-list backend.
//! This crate is the single source of truth for ordering and membership
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, schema_version, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{
    Category, CategoryId, CategoryItem, CategoryItemId, CategoryItemPatch, CategoryPatch,
    ExpandedCategory, ExpandedCategoryItem, OtherCategory,
};
pub use model::feedback::Feedback;
pub use model::item::{Item, ItemId, ItemPatch, NewItem, WeightUnit};
pub use model::list::{ExpandedList, ListId, ListMember, ListPatch, NewList, PackingList};
pub use model::user::{User, UserId};
pub use model::EntityKind;
pub use ordering::{MoveCoordinator, MoveError};
pub use repo::{RepoError, RepoResult};
pub use service::category_item_service::CategoryItemService;
pub use service::category_service::CategoryService;
pub use service::feedback_service::FeedbackService;
pub use service::item_service::ItemService;
pub use service::list_service::ListService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
