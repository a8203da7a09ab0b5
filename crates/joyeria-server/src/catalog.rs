//! Product catalog service: validation, listing and owner-scoped mutation.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use joyeria_shared::constants::{
    DEFAULT_MATERIAL, DEFAULT_STOCK, PRODUCT_NAME_MAX, PRODUCT_NAME_MIN,
};
use joyeria_shared::{Identity, NumberLike, Product, ProductInput, ProductQuery};
use joyeria_store::{timestamp_now, ProductFilter, StoreError};

use crate::api::SharedDb;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::guard::Authorized;

const PRODUCT_NOT_FOUND: &str = "Producto no encontrado";

/// Closed value sets and limits applied to product input.
#[derive(Debug, Clone)]
pub struct CatalogRules {
    pub categories: Vec<String>,
    pub materials: Vec<String>,
    pub list_limit: usize,
}

impl CatalogRules {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            categories: config.categories.clone(),
            materials: config.materials.clone(),
            list_limit: config.product_list_limit,
        }
    }

    fn name(&self, raw: &str) -> Result<String, ApiError> {
        let name = raw.trim();
        let len = name.chars().count();
        if len < PRODUCT_NAME_MIN {
            return Err(ApiError::invalid("El nombre es muy corto"));
        }
        if len > PRODUCT_NAME_MAX {
            return Err(ApiError::invalid("El nombre es muy largo"));
        }
        Ok(name.to_string())
    }

    fn category(&self, raw: &str) -> Result<String, ApiError> {
        pick(&self.categories, raw).ok_or_else(|| ApiError::invalid("Categoría inválida"))
    }

    fn material(&self, raw: &str) -> Result<String, ApiError> {
        pick(&self.materials, raw).ok_or_else(|| ApiError::invalid("Material inválido"))
    }

    fn default_material(&self) -> String {
        if self.materials.iter().any(|m| m == DEFAULT_MATERIAL) {
            DEFAULT_MATERIAL.to_string()
        } else {
            self.materials
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_MATERIAL.to_string())
        }
    }
}

fn pick(allowed: &[String], raw: &str) -> Option<String> {
    let value = raw.trim();
    allowed.iter().find(|a| a.as_str() == value).cloned()
}

fn price(raw: &NumberLike) -> Result<f64, ApiError> {
    let value = raw
        .to_f64()
        .ok_or_else(|| ApiError::invalid("Price debe ser un número"))?;
    if value < 0.0 {
        return Err(ApiError::invalid("Precio inválido"));
    }
    Ok(value)
}

fn stock(raw: &NumberLike) -> Result<i64, ApiError> {
    match raw.to_i64() {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(ApiError::invalid("Stock inválido")),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct CatalogService {
    db: SharedDb,
    rules: Arc<CatalogRules>,
}

impl CatalogService {
    pub fn new(db: SharedDb, rules: CatalogRules) -> Self {
        Self {
            db,
            rules: Arc::new(rules),
        }
    }

    /// Validate `input` and persist it as a new product owned by `owner`.
    pub async fn create(&self, owner: &Identity, input: ProductInput) -> Result<Product, ApiError> {
        let (Some(name), Some(category), Some(raw_price)) = (
            non_empty(&input.name),
            non_empty(&input.category),
            input.price.as_ref(),
        ) else {
            return Err(ApiError::invalid("Campos requeridos: name, category, price"));
        };

        let material = match non_empty(&input.material) {
            Some(m) => self.rules.material(m)?,
            None => self.rules.default_material(),
        };
        let stock = match &input.stock {
            Some(raw) => stock(raw)?,
            None => DEFAULT_STOCK,
        };

        let now = timestamp_now();
        let product = Product {
            id: Uuid::new_v4(),
            name: self.rules.name(name)?,
            description: input.description.as_deref().unwrap_or("").trim().to_string(),
            meta: input.meta.as_deref().unwrap_or("").trim().to_string(),
            category: self.rules.category(category)?,
            material,
            price: price(raw_price)?,
            stock,
            images: input.images.map(|i| i.normalize()).unwrap_or_default(),
            seller: owner.id,
            created_at: now,
            updated_at: now,
        };

        self.db.lock().await.insert_product(&product)?;
        info!(product_id = %product.id, seller = %owner.id, "product created");
        Ok(product)
    }

    /// Products narrowed by exact-match fields, newest first. A `seller`
    /// that is not a user id matches nothing.
    pub async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, ApiError> {
        let seller = match non_empty(&query.seller) {
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!(seller = raw, "seller filter is not a user id");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };
        let filter = ProductFilter {
            category: non_empty(&query.category).map(str::to_string),
            material: non_empty(&query.material).map(str::to_string),
            seller,
        };

        let products = self
            .db
            .lock()
            .await
            .list_products(&filter, self.rules.list_limit)?;
        Ok(products)
    }

    pub async fn list_mine(&self, owner: &Identity) -> Result<Vec<Product>, ApiError> {
        let products = self
            .db
            .lock()
            .await
            .list_products(&ProductFilter::by_seller(owner.id), self.rules.list_limit)?;
        Ok(products)
    }

    /// Fetch a product by its path id. Malformed ids are reported as missing.
    pub async fn load(&self, id: &str) -> Result<Product, ApiError> {
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        let found = self.db.lock().await.get_product(id);
        found.map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            other => other.into(),
        })
    }

    /// Apply the mutable fields present in `input`. `seller` and `createdAt`
    /// are never touched.
    pub async fn update(
        &self,
        target: Authorized<Product>,
        input: ProductInput,
    ) -> Result<Product, ApiError> {
        let mut product = target.into_inner();

        if let Some(name) = &input.name {
            product.name = self.rules.name(name)?;
        }
        if let Some(description) = &input.description {
            product.description = description.trim().to_string();
        }
        if let Some(meta) = &input.meta {
            product.meta = meta.trim().to_string();
        }
        if let Some(category) = &input.category {
            product.category = self.rules.category(category)?;
        }
        if let Some(material) = &input.material {
            product.material = self.rules.material(material)?;
        }
        if let Some(raw) = &input.price {
            product.price = price(raw)?;
        }
        if let Some(raw) = &input.stock {
            product.stock = stock(raw)?;
        }
        if let Some(images) = &input.images {
            product.images = images.normalize();
        }
        product.updated_at = timestamp_now();

        self.db.lock().await.update_product(&product).map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            other => other.into(),
        })?;
        info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    pub async fn delete(&self, target: Authorized<Product>) -> Result<Uuid, ApiError> {
        let id = target.get().id;
        if !self.db.lock().await.delete_product(id)? {
            return Err(ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()));
        }
        info!(product_id = %id, "product deleted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use joyeria_shared::{ImageList, Role};
    use joyeria_store::{Database, NewUser};
    use tokio::sync::Mutex;

    use super::*;
    use crate::guard::authorize;

    async fn setup() -> (CatalogService, Identity) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                first_name: "Ana".into(),
                last_name: "Mora".into(),
                email: "ana@example.com".into(),
                password_hash: "$2b$04$hash".into(),
                role: Role::Seller,
            })
            .unwrap();
        let owner = Identity {
            id: user.id,
            email: user.email,
            role: user.role,
        };
        let service = CatalogService::new(
            Arc::new(Mutex::new(db)),
            CatalogRules::from_config(&ServerConfig::default()),
        );
        (service, owner)
    }

    fn ring() -> ProductInput {
        ProductInput {
            name: Some(" Anillo luna ".into()),
            category: Some("Anillos".into()),
            price: Some(NumberLike::Text("60000".into())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let (catalog, owner) = setup().await;
        let product = catalog.create(&owner, ring()).await.unwrap();

        assert_eq!(product.name, "Anillo luna");
        assert_eq!(product.material, "Plata");
        assert_eq!(product.stock, 1);
        assert_eq!(product.price, 60000.0);
        assert!(product.images.is_empty());
        assert_eq!(product.seller, owner.id);
    }

    #[tokio::test]
    async fn test_create_requires_name_category_and_price() {
        let (catalog, owner) = setup().await;
        let mut input = ring();
        input.price = None;

        match catalog.create(&owner, input).await.unwrap_err() {
            ApiError::InvalidInput { message, .. } => {
                assert_eq!(message, "Campos requeridos: name, category, price")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_values() {
        let (catalog, owner) = setup().await;

        let mut input = ring();
        input.price = Some(NumberLike::Text("caro".into()));
        assert!(matches!(
            catalog.create(&owner, input).await,
            Err(ApiError::InvalidInput { .. })
        ));

        let mut input = ring();
        input.price = Some(NumberLike::Number(-1.0));
        assert!(catalog.create(&owner, input).await.is_err());

        let mut input = ring();
        input.category = Some("Relojes".into());
        assert!(catalog.create(&owner, input).await.is_err());

        let mut input = ring();
        input.name = Some("A".into());
        assert!(catalog.create(&owner, input).await.is_err());

        let mut input = ring();
        input.stock = Some(NumberLike::Number(-3.0));
        assert!(catalog.create(&owner, input).await.is_err());
    }

    #[tokio::test]
    async fn test_update_touches_only_given_fields() {
        let (catalog, owner) = setup().await;
        let created = catalog.create(&owner, ring()).await.unwrap();

        let loaded = catalog.load(&created.id.to_string()).await.unwrap();
        let target = authorize(&owner, Some(loaded)).unwrap();
        let updated = catalog
            .update(
                target,
                ProductInput {
                    price: Some(NumberLike::Number(75000.0)),
                    images: Some(ImageList::Csv("a.jpg, b.jpg".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, created.name);
        assert_eq!(updated.price, 75000.0);
        assert_eq!(updated.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_load_reports_missing_and_malformed_ids() {
        let (catalog, _) = setup().await;
        assert!(matches!(
            catalog.load("no-es-uuid").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            catalog.load(&Uuid::new_v4().to_string()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_ignores_malformed_seller() {
        let (catalog, owner) = setup().await;
        catalog.create(&owner, ring()).await.unwrap();
        let mut necklace = ring();
        necklace.category = Some("Collares".into());
        catalog.create(&owner, necklace).await.unwrap();

        let rings = catalog
            .list(ProductQuery {
                category: Some("Anillos".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rings.len(), 1);

        assert_eq!(catalog.list_mine(&owner).await.unwrap().len(), 2);

        let unknown_seller = catalog
            .list(ProductQuery {
                seller: Some("nope".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(unknown_seller.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_the_product() {
        let (catalog, owner) = setup().await;
        let created = catalog.create(&owner, ring()).await.unwrap();

        let target = authorize(&owner, Some(created.clone())).unwrap();
        assert_eq!(catalog.delete(target).await.unwrap(), created.id);

        let again = authorize(&owner, Some(created)).unwrap();
        assert!(matches!(
            catalog.delete(again).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
