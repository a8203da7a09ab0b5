//! Store-side models.
//!
//! Products are persisted as the shared [`Product`] wire type. Users carry a
//! password hash and therefore get a store-only record type that is projected
//! before it leaves the server.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use joyeria_shared::protocol::Profile;
use joyeria_shared::{PublicUser, Role};

pub use joyeria_shared::Product;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A stored account, including its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Trimmed and lower-cased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Projection safe to return to clients.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }

    /// Full profile without the hash.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role,
            email_verified: self.email_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for [`Database::create_user`](crate::Database::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Product listing
// ---------------------------------------------------------------------------

/// Exact-match narrowing for product listings. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub material: Option<String>,
    pub seller: Option<Uuid>,
}

impl ProductFilter {
    pub fn by_seller(seller: Uuid) -> Self {
        Self {
            seller: Some(seller),
            ..Self::default()
        }
    }
}
