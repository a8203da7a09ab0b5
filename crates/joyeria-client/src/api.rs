//! HTTP client for the storefront REST API.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use joyeria_shared::protocol::{
    AuthResponse, DeleteResponse, ErrorBody, HealthResponse, LoginRequest, ProductListResponse,
    ProductResponse, SignupRequest, WhoAmIResponse,
};
use joyeria_shared::{Product, ProductInput, ProductQuery};

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Client for the API rooted at `base` (e.g. `http://localhost:5000`).
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let mut base = base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(&base)?,
            token: None,
        })
    }

    /// Same client, sending `token` as a bearer credential.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path)?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        op: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(|e| {
            error!(op, error = %e, "request failed");
            ClientError::Http(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &bytes);
            error!(op, status = status.as_u16(), %message, "request rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value = serde_json::from_slice(&bytes)?;
        debug!(op, status = status.as_u16(), "request succeeded");
        Ok(value)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        op: &'static str,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let builder = self.request(method, path)?.json(body);
        self.send(op, builder).await
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.send_json("signup", Method::POST, "api/auth/signup", req)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let req = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.send_json("login", Method::POST, "api/auth/login", &req)
            .await
    }

    /// Resolve the current token to its user.
    pub async fn me(&self) -> Result<WhoAmIResponse, ClientError> {
        let builder = self.request(Method::GET, "api/auth/test")?;
        self.send("me", builder).await
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ClientError> {
        let builder = self.request(Method::GET, "api/products")?.query(query);
        let list: ProductListResponse = self.send("list_products", builder).await?;
        Ok(list.products)
    }

    pub async fn list_mine(&self) -> Result<Vec<Product>, ClientError> {
        let builder = self.request(Method::GET, "api/products/mine")?;
        let list: ProductListResponse = self.send("list_mine", builder).await?;
        Ok(list.products)
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        let created: ProductResponse = self
            .send_json("create_product", Method::POST, "api/products", input)
            .await?;
        Ok(created.product)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        input: &ProductInput,
    ) -> Result<Product, ClientError> {
        let path = format!("api/products/{id}");
        let updated: ProductResponse = self
            .send_json("update_product", Method::PUT, &path, input)
            .await?;
        Ok(updated.product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<Uuid, ClientError> {
        let builder = self.request(Method::DELETE, &format!("api/products/{id}"))?;
        let deleted: DeleteResponse = self.send("delete_product", builder).await?;
        Ok(deleted.id)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let builder = self.request(Method::GET, "healthz")?;
        self.send("health", builder).await
    }
}

/// The server's `message` when the body carries one, else a generic text.
fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed {status}"))
}
