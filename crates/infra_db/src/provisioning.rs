//! Principal directory provisioning
//!
//! Claims reference the `users` table for their owner and decision actors,
//! so a fresh database needs at least one account per role before anything
//! can be submitted. Provisioning is explicit and idempotent: existing
//! usernames are left untouched.

use sqlx::PgPool;
use tracing::info;

use core_kernel::{Role, UserId};

use crate::error::DatabaseError;

/// User role enumeration as stored in the `user_role` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Employee,
    Manager,
    Finance,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Employee => UserRole::Employee,
            Role::Manager => UserRole::Manager,
            Role::Finance => UserRole::Finance,
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Employee => Role::Employee,
            UserRole::Manager => Role::Manager,
            UserRole::Finance => Role::Finance,
        }
    }
}

/// One account in the principal directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl DirectoryEntry {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            role,
        }
    }
}

/// One account per role, for development and demo databases
pub fn default_directory() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry::new("employee", "Default Employee", Role::Employee),
        DirectoryEntry::new("manager", "Default Manager", Role::Manager),
        DirectoryEntry::new("finance", "Default Finance", Role::Finance),
    ]
}

/// Inserts the entries whose username is not taken yet
///
/// Returns the number of accounts actually created.
pub async fn provision_directory(
    pool: &PgPool,
    entries: &[DirectoryEntry],
) -> Result<u64, DatabaseError> {
    let mut tx = pool.begin().await?;
    let mut created = 0;

    for entry in entries {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, full_name, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&entry.username)
        .bind(&entry.full_name)
        .bind(UserRole::from(entry.role))
        .execute(&mut *tx)
        .await?;
        created += result.rows_affected();
    }

    tx.commit().await?;
    info!(requested = entries.len(), created, "Principal directory provisioned");
    Ok(created)
}

/// Looks up the id assigned to a username
pub async fn find_user_id(pool: &PgPool, username: &str) -> Result<UserId, DatabaseError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .map(UserId::new)
        .ok_or_else(|| DatabaseError::not_found("User", username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directory_covers_every_role() {
        let directory = default_directory();
        for role in Role::ALL {
            assert!(directory.iter().any(|entry| entry.role == role));
        }
    }

    #[test]
    fn test_role_mapping_is_total() {
        for role in Role::ALL {
            assert_eq!(Role::from(UserRole::from(role)), role);
        }
    }
}
