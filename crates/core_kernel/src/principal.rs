//! Authenticated principals
//!
//! A `Principal` is produced by the credential layer and trusted verbatim by
//! the domain. Roles are a closed set so that every dispatch on them is an
//! exhaustive match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifiers::UserId;

/// Role carried by an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits and maintains their own claims
    Employee,
    /// Decides the first approval stage
    Manager,
    /// Decides the second approval stage
    Finance,
}

impl Role {
    /// All roles, in directory order
    pub const ALL: [Role; 3] = [Role::Employee, Role::Manager, Role::Finance];

    /// Returns the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Finance => "finance",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "finance" => Ok(Role::Finance),
            other => Err(CoreError::unknown_variant("role", other)),
        }
    }
}

/// An authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn employee(id: impl Into<UserId>) -> Self {
        Self::new(id.into(), Role::Employee)
    }

    pub fn manager(id: impl Into<UserId>) -> Self {
        Self::new(id.into(), Role::Manager)
    }

    pub fn finance(id: impl Into<UserId>) -> Self {
        Self::new(id.into(), Role::Finance)
    }

    /// True when the principal may only see their own claims
    pub fn is_employee(&self) -> bool {
        matches!(self.role, Role::Employee)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
