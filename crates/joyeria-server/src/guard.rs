//! Role and ownership checks for mutating routes.

use uuid::Uuid;

use joyeria_shared::{Identity, Product, Role};

use crate::error::ApiError;

/// A resource with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Product {
    fn owner_id(&self) -> Uuid {
        self.seller
    }
}

/// A loaded resource the requester has been cleared to mutate.
///
/// Only [`authorize`] builds one, so services that take it cannot be reached
/// without the ownership check.
#[derive(Debug)]
pub struct Authorized<T>(T);

impl<T> Authorized<T> {
    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Permit when the requester is an admin or owns `resource`.
///
/// `resource` must already be loaded; `None` is a caller bug and maps to a
/// 500.
pub fn authorize<T: Owned>(
    requester: &Identity,
    resource: Option<T>,
) -> Result<Authorized<T>, ApiError> {
    let Some(resource) = resource else {
        return Err(ApiError::Internal(
            "product not loaded for ownership check".to_string(),
        ));
    };

    if requester.role == Role::Admin || requester.id == resource.owner_id() {
        return Ok(Authorized(resource));
    }

    tracing::debug!(
        user_id = %requester.id,
        owner_id = %resource.owner_id(),
        "ownership check denied"
    );
    Err(ApiError::Forbidden("Forbidden: not owner or admin".to_string()))
}

/// Require one of `roles`.
pub fn require_role(requester: &Identity, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&requester.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Acceso denegado (rol insuficiente)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Doc(Uuid);

    impl Owned for Doc {
        fn owner_id(&self) -> Uuid {
            self.0
        }
    }

    fn who(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "x@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_owner_is_permitted() {
        let seller = who(Role::Seller);
        let doc = Doc(seller.id);
        assert!(authorize(&seller, Some(doc)).is_ok());
    }

    #[test]
    fn test_admin_is_permitted_on_any_resource() {
        let admin = who(Role::Admin);
        let doc = Doc(Uuid::new_v4());
        let granted = authorize(&admin, Some(doc)).unwrap();
        assert_ne!(granted.get().owner_id(), admin.id);
    }

    #[test]
    fn test_other_seller_is_forbidden() {
        let seller = who(Role::Seller);
        let err = authorize(&seller, Some(Doc(Uuid::new_v4()))).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_missing_resource_is_internal_error() {
        let admin = who(Role::Admin);
        let err = authorize::<Doc>(&admin, None).unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_role_gate() {
        let sellers = [Role::Seller, Role::Admin];
        assert!(require_role(&who(Role::Seller), &sellers).is_ok());
        assert!(require_role(&who(Role::Admin), &sellers).is_ok());
        assert!(matches!(
            require_role(&who(Role::User), &sellers),
            Err(ApiError::Forbidden(_))
        ));
    }
}
