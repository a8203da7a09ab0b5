use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{
        header::{self, HeaderValue},
        Method, StatusCode,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use joyeria_shared::protocol::{
    AuthResponse, DeleteResponse, HealthResponse, LoginRequest, ProductListResponse,
    ProductResponse, SignupRequest, WhoAmIResponse,
};
use joyeria_shared::{ProductInput, ProductQuery, Role};
use joyeria_store::Database;

use crate::auth::{ApiJson, AuthService, AuthUser, TokenIssuer};
use crate::catalog::{CatalogRules, CatalogService};
use crate::config::{ephemeral_secret, ServerConfig};
use crate::error::ApiError;
use crate::guard::{authorize, require_role};
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

/// The single SQLite handle shared by every request.
pub type SharedDb = Arc<Mutex<Database>>;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the services over `db`. Without `JWT_SECRET` a random secret is
    /// used for the lifetime of this state.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let db: SharedDb = Arc::new(Mutex::new(db));
        let secret = config.jwt_secret.clone().unwrap_or_else(ephemeral_secret);
        let tokens = TokenIssuer::new(&secret, config.token_ttl);

        Self {
            auth: AuthService::new(
                db.clone(),
                tokens,
                config.bcrypt_cost,
                config.open_role_signup,
            ),
            catalog: CatalogService::new(db, CatalogRules::from_config(&config)),
            rate_limiter: RateLimiter::per_window(config.rate_max, config.rate_window),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/test", get(whoami))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/mine", get(list_my_products))
        .route(
            "/api/products/:id",
            put(update_product).delete(delete_product),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origin.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: Utc::now(),
    })
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Ruta no encontrada".to_string())
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (user, token) = state.auth.signup(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Usuario creado".to_string(),
            user: user.public(),
            token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = state.auth.login(req).await?;
    Ok(Json(AuthResponse {
        message: "Login success".to_string(),
        user: user.public(),
        token,
    }))
}

async fn whoami(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> Json<WhoAmIResponse> {
    let user = state.auth.hydrate(who).await;
    Json(WhoAmIResponse {
        ok: true,
        message: "Token válido".to_string(),
        user,
    })
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.catalog.list(query).await?;
    Ok(Json(ProductListResponse {
        ok: true,
        count: products.len(),
        products,
    }))
}

async fn list_my_products(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.catalog.list_mine(&who).await?;
    Ok(Json(ProductListResponse {
        ok: true,
        count: products.len(),
        products,
    }))
}

async fn create_product(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    require_role(&who, &[Role::Seller, Role::Admin])?;
    let product = state.catalog.create(&who, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Producto creado".to_string(),
            product,
        }),
    ))
}

async fn update_product(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.load(&id).await?;
    let target = authorize(&who, Some(product))?;
    let product = state.catalog.update(target, input).await?;
    Ok(Json(ProductResponse {
        message: "Producto actualizado".to_string(),
        product,
    }))
}

async fn delete_product(
    State(state): State<AppState>,
    AuthUser(who): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let product = state.catalog.load(&id).await?;
    let target = authorize(&who, Some(product))?;
    let id = state.catalog.delete(target).await?;
    Ok(Json(DeleteResponse {
        message: "Producto eliminado".to_string(),
        id,
    }))
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Serve the API on `addr` until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
