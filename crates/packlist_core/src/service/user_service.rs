//! User account use-case service.
//!
//! # Invariants
//! - Emails are normalized before lookup and storage.
//! - Registering an email twice is a `Conflict` on the existing user.

use crate::model::user::{normalize_email, User, UserId};
use crate::model::EntityKind;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::{ServiceError, ServiceResult};
use rusqlite::Connection;

/// User service facade.
pub struct UserService<'conn> {
    users: SqliteUserRepository<'conn>,
}

impl<'conn> UserService<'conn> {
    /// Creates service from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            users: SqliteUserRepository::try_new(conn)?,
        })
    }

    /// Registers a new user under a normalized email.
    pub fn register(&self, email: &str, name: impl Into<String>) -> ServiceResult<User> {
        let email =
            normalize_email(email).map_err(|err| ServiceError::Validation(err.to_string()))?;
        if let Some(existing) = self.users.find_by_email(&email)? {
            return Err(ServiceError::Conflict {
                kind: EntityKind::User,
                id: existing.id,
            });
        }
        let name = name.into();
        Ok(self.users.create_user(&email, name.trim())?)
    }

    pub fn get(&self, id: UserId) -> ServiceResult<User> {
        self.users.get_user(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::User,
            id,
        })
    }

    /// Deletes one user together with memberships, items, and feedback.
    ///
    /// Lists the user was the last member of stay behind unreachable.
    pub fn remove(&self, id: UserId) -> ServiceResult<()> {
        Ok(self.users.delete_user(id)?)
    }
}
