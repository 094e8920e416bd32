//! Acting user and privilege checks.
//!
//! Role resolution itself happens outside this crate; callers hand in an
//! [`Actor`] for every mutating call and the repository checks it before it
//! touches the database.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

/// Serialized through `Display` / `FromStr`, so config files accept the same
/// aliases as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum Role {
    Admin,
    Manager,
    Player,
}

impl Role {
    /// Admins and managers may change schedules, statuses and games.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Player => write!(f, "player"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" | "coach" => Ok(Role::Manager),
            "player" | "member" => Ok(Role::Player),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// Refuses the call unless the actor holds elevated privilege.
    pub fn authorize(&self, action: &'static str) -> Result<(), CoreError> {
        if self.is_privileged() {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = %self.role, action, "refused unprivileged actor");
            Err(CoreError::Unauthorized { action })
        }
    }
}
