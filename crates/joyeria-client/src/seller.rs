//! Seller panel form for publishing a product.

use tracing::{debug, error};

use joyeria_shared::constants::{DEFAULT_CATEGORIES, DEFAULT_MATERIAL, DEFAULT_STOCK};
use joyeria_shared::{NumberLike, Product, ProductInput};

use crate::api::ApiClient;
use crate::error::ClientError;

const MISSING_FIELDS: &str = "Por favor completa: nombre, categoría y precio.";
const CREATED: &str = "Producto creado correctamente.";

/// Raw form fields as typed by the user, plus submit feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerForm {
    pub name: String,
    pub category: String,
    pub material: String,
    pub price: String,
    pub description: String,
    pub stock: String,
    pub error: Option<String>,
    pub success: Option<String>,
    pub submitting: bool,
}

impl Default for SellerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: DEFAULT_CATEGORIES[0].to_string(),
            material: DEFAULT_MATERIAL.to_string(),
            price: String::new(),
            description: String::new(),
            stock: DEFAULT_STOCK.to_string(),
            error: None,
            success: None,
            submitting: false,
        }
    }
}

impl SellerForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the fields and build the request body.
    pub fn validate(&self) -> Result<ProductInput, String> {
        let name = self.name.trim();
        let category = self.category.trim();
        let price = self.price.trim();
        if name.is_empty() || category.is_empty() || price.is_empty() {
            return Err(MISSING_FIELDS.to_string());
        }

        let price: f64 = price
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| "El precio debe ser un número.".to_string())?;

        let stock = match self.stock.trim() {
            "" => DEFAULT_STOCK,
            raw => raw
                .parse::<i64>()
                .ok()
                .filter(|s| *s >= 0)
                .ok_or_else(|| "El stock debe ser un entero no negativo.".to_string())?,
        };

        let material = self.material.trim();
        let description = self.description.trim();

        Ok(ProductInput {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            material: (!material.is_empty()).then(|| material.to_string()),
            price: Some(NumberLike::Number(price)),
            description: Some(description.to_string()),
            stock: Some(NumberLike::Number(stock as f64)),
            ..ProductInput::default()
        })
    }

    /// Validate and create the product. On success the fields reset to their
    /// defaults and `success` is set; on failure `error` carries the message.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Product, ClientError> {
        self.error = None;
        self.success = None;

        let input = match self.validate() {
            Ok(input) => input,
            Err(message) => {
                self.error = Some(message.clone());
                return Err(ClientError::Invalid(message));
            }
        };

        self.submitting = true;
        let result = api.create_product(&input).await;
        self.submitting = false;

        match result {
            Ok(product) => {
                debug!(product_id = %product.id, "product published");
                *self = Self {
                    success: Some(CREATED.to_string()),
                    ..Self::default()
                };
                Ok(product)
            }
            Err(e) => {
                error!(error = %e, "product create failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::api::tests::{sample_product, serve_stub};

    fn filled() -> SellerForm {
        SellerForm {
            name: " Anillo luna ".into(),
            price: "60000".into(),
            description: "Plata 925".into(),
            ..SellerForm::new()
        }
    }

    #[test]
    fn test_defaults() {
        let form = SellerForm::new();
        assert_eq!(form.category, "Anillos");
        assert_eq!(form.material, "Plata");
        assert_eq!(form.stock, "1");
    }

    #[test]
    fn test_missing_fields_use_one_message() {
        let form = SellerForm::new();
        assert_eq!(form.validate().unwrap_err(), MISSING_FIELDS);

        let mut form = filled();
        form.category = "  ".into();
        assert_eq!(form.validate().unwrap_err(), MISSING_FIELDS);
    }

    #[test]
    fn test_price_and_stock_must_be_numbers() {
        let mut form = filled();
        form.price = "mucho".into();
        assert!(form.validate().is_err());

        let mut form = filled();
        form.stock = "-2".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_valid_form_builds_trimmed_input() {
        let input = filled().validate().unwrap();
        assert_eq!(input.name.as_deref(), Some("Anillo luna"));
        assert_eq!(input.price, Some(NumberLike::Number(60000.0)));
        assert_eq!(input.stock, Some(NumberLike::Number(1.0)));
        assert_eq!(input.material.as_deref(), Some("Plata"));
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_the_server() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut form = SellerForm::new();
        let err = form.submit(&api).await.unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
        assert_eq!(form.error.as_deref(), Some(MISSING_FIELDS));
    }

    #[tokio::test]
    async fn test_successful_submit_resets_the_form() {
        let router = Router::new().route(
            "/api/products",
            post(|Json(body): Json<Value>| async move {
                let mut product = sample_product("Anillo luna", 1);
                product.name = body["name"].as_str().unwrap_or_default().to_string();
                (
                    StatusCode::CREATED,
                    Json(json!({ "message": "Producto creado", "product": product })),
                )
            }),
        );
        let api = ApiClient::new(&serve_stub(router).await).unwrap();

        let mut form = filled();
        let product = form.submit(&api).await.unwrap();
        assert_eq!(product.name, "Anillo luna");
        assert_eq!(form.success.as_deref(), Some(CREATED));
        assert!(form.name.is_empty());
        assert!(form.error.is_none());
        assert!(!form.submitting);
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_fields() {
        let router = Router::new().route(
            "/api/products",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "message": "Acceso denegado (rol insuficiente)" })),
                )
            }),
        );
        let api = ApiClient::new(&serve_stub(router).await).unwrap();

        let mut form = filled();
        assert!(form.submit(&api).await.is_err());
        assert_eq!(
            form.error.as_deref(),
            Some("Acceso denegado (rol insuficiente)")
        );
        assert_eq!(form.name, " Anillo luna ");
    }
}
