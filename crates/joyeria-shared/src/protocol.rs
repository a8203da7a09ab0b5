//! JSON request and response bodies of the REST API.
//!
//! Field names are camelCase on the wire. Request fields are optional so the
//! server can report every missing field instead of failing on the first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::FieldError;
use crate::types::{Identity, PublicUser, Role};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Returned by signup (201) and login (200).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

/// Stored profile without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The hydrated profile when available, else the token's own identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedUser {
    Profile(Profile),
    Basic(Identity),
}

impl ResolvedUser {
    pub fn id(&self) -> Uuid {
        match self {
            ResolvedUser::Profile(p) => p.id,
            ResolvedUser::Basic(i) => i.id,
        }
    }
}

/// `GET /api/auth/test`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub ok: bool,
    pub message: String,
    pub user: ResolvedUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub ok: bool,
    pub count: usize,
    pub products: Vec<Product>,
}

/// Create (201) and update (200).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub time: DateTime<Utc>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_uses_camel_case() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"firstName":"Ana","lastName":"Mora","email":"a@b.co","password":"x"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ana"));
        assert_eq!(req.last_name.as_deref(), Some("Mora"));
        assert!(req.role.is_none());
    }

    #[test]
    fn test_resolved_user_prefers_profile_shape() {
        let id = Uuid::new_v4();
        let basic = serde_json::json!({ "id": id, "email": "a@b.co", "role": "User" });
        let parsed: ResolvedUser = serde_json::from_value(basic).unwrap();
        assert!(matches!(parsed, ResolvedUser::Basic(_)));
        assert_eq!(parsed.id(), id);
    }

    #[test]
    fn test_error_body_omits_empty_errors() {
        let body = ErrorBody {
            message: "Not found".into(),
            errors: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"message":"Not found"}"#
        );
    }
}
