use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SharedError;

/// Account role. New accounts are `User` unless stated otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    User,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Seller => "Seller",
            Role::Admin => "Admin",
        }
    }

    /// Roles allowed to publish products.
    pub fn can_sell(&self) -> bool {
        matches!(self, Role::Seller | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Seller" => Ok(Role::Seller),
            "Admin" => Ok(Role::Admin),
            other => Err(SharedError::InvalidRole(other.to_string())),
        }
    }
}

/// Identity resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Bearer token payload: the identity plus issued-at / expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// User projection that is safe to hand to clients (never carries the hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_known_names_only() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
        assert!("Root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_as_plain_name() {
        let json = serde_json::to_string(&Role::Seller).unwrap();
        assert_eq!(json, "\"Seller\"");
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_only_sellers_and_admins_can_sell() {
        assert!(!Role::User.can_sell());
        assert!(Role::Seller.can_sell());
        assert!(Role::Admin.can_sell());
    }
}
