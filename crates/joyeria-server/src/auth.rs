//! Accounts and bearer tokens.
//!
//! [`TokenIssuer`] signs and verifies HS256 tokens carrying the
//! [`Claims`] payload. [`AuthService`] registers and authenticates users
//! against the credential store. [`AuthUser`] is the axum extractor that
//! turns an `Authorization: Bearer <token>` header into an [`Identity`].

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use joyeria_shared::policy::validate_password_strength;
use joyeria_shared::protocol::{LoginRequest, ResolvedUser, SignupRequest};
use joyeria_shared::{Claims, FieldError, Identity, Role};
use joyeria_store::{NewUser, UserRecord};

use crate::api::{AppState, SharedDb};
use crate::config::Secret;
use crate::error::ApiError;

const INVALID_TOKEN: &str = "Token inválido o expirado";
const MISSING_TOKEN: &str = "Authorization token missing";

// ---------------------------------------------------------------------------
// Token issuer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &Secret, ttl: Duration) -> Self {
        let bytes = secret.expose().as_bytes();
        Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
            ttl,
        }
    }

    /// Sign a token for `identity`, valid for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry. Never touches the store.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                ApiError::InvalidToken(INVALID_TOKEN.to_string())
            })
    }
}

// ---------------------------------------------------------------------------
// Auth service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthService {
    db: SharedDb,
    tokens: TokenIssuer,
    hash_cost: u32,
    open_role_signup: bool,
}

/// Signup input after validation.
#[derive(Debug)]
struct ValidSignup {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    role: Role,
}

impl AuthService {
    pub fn new(db: SharedDb, tokens: TokenIssuer, hash_cost: u32, open_role_signup: bool) -> Self {
        Self {
            db,
            tokens,
            hash_cost,
            open_role_signup,
        }
    }

    /// Register an account and sign a token for it.
    pub async fn signup(&self, req: SignupRequest) -> Result<(UserRecord, String), ApiError> {
        let mut valid = validate_signup(req)?;

        if valid.role != Role::User && !self.open_role_signup {
            warn!(requested = %valid.role, "role signup disabled, creating plain user");
            valid.role = Role::User;
        }

        let cost = self.hash_cost;
        let password = valid.password;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("hash task failed: {e}")))?
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

        let user = self.db.lock().await.create_user(&NewUser {
            first_name: valid.first_name,
            last_name: valid.last_name,
            email: valid.email,
            password_hash,
            role: valid.role,
        })?;

        let token = self.tokens.issue(&identity_of(&user))?;
        info!(user_id = %user.id, role = %user.role, "user signed up");
        Ok((user, token))
    }

    /// Check credentials and sign a token. Unknown email and wrong password
    /// produce the same error.
    pub async fn login(&self, req: LoginRequest) -> Result<(UserRecord, String), ApiError> {
        let form = LoginForm::from(req);
        form.validate().map_err(|e| ApiError::validation(field_errors(&e, &LOGIN_FIELDS)))?;
        let LoginForm { email, password } = form;

        let Some(user) = self.db.lock().await.find_user_by_email(&email)? else {
            debug!("login for unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))?
            .unwrap_or_else(|e| {
                warn!(user_id = %user.id, error = %e, "stored password hash is unreadable");
                false
            });
        if !matches {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.tokens.issue(&identity_of(&user))?;
        info!(user_id = %user.id, "login success");
        Ok((user, token))
    }

    /// Identity carried by a verified token.
    pub fn resolve_identity(&self, token: &str) -> Result<Identity, ApiError> {
        self.tokens.verify(token).map(|claims| claims.identity())
    }

    /// Stored profile for `identity`, or the identity itself when the lookup
    /// fails.
    pub async fn hydrate(&self, identity: Identity) -> ResolvedUser {
        let lookup = self.db.lock().await.get_user(identity.id);
        match lookup {
            Ok(user) => ResolvedUser::Profile(user.profile()),
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "user lookup failed, returning token identity");
                ResolvedUser::Basic(identity)
            }
        }
    }
}

fn identity_of(user: &UserRecord) -> Identity {
    Identity {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Signup body after trimming; blank fields become `None`.
#[derive(Debug, Validate)]
struct SignupForm {
    #[validate(
        required(message = "Nombres es requerido."),
        length(max = 80, message = "Nombres máx 80 caracteres.")
    )]
    first_name: Option<String>,

    #[validate(
        required(message = "Apellidos es requerido."),
        length(max = 80, message = "Apellidos máx 80 caracteres.")
    )]
    last_name: Option<String>,

    #[validate(
        required(message = "Email es requerido."),
        email(message = "Email no es válido.")
    )]
    email: Option<String>,

    #[validate(custom(function = "password_rule"))]
    password: String,

    #[validate(custom(function = "role_rule"))]
    role: String,
}

/// Response `param` for each form field, in report order.
const SIGNUP_FIELDS: [(&str, &str); 5] = [
    ("first_name", "firstName"),
    ("last_name", "lastName"),
    ("email", "email"),
    ("password", "password"),
    ("role", "role"),
];

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<SignupRequest> for SignupForm {
    fn from(req: SignupRequest) -> Self {
        Self {
            first_name: trimmed(req.first_name),
            last_name: trimmed(req.last_name),
            email: trimmed(req.email),
            password: req.password.unwrap_or_default(),
            role: trimmed(req.role).unwrap_or_default(),
        }
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn password_rule(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(rule_error("required", "Contraseña es requerida."));
    }
    validate_password_strength(password)
}

/// Blank means the default role.
fn role_rule(role: &str) -> Result<(), ValidationError> {
    if role.is_empty() || role.parse::<Role>().is_ok() {
        return Ok(());
    }
    Err(rule_error("role", "Rol inválido."))
}

const LOGIN_FIELDS: [(&str, &str); 2] = [("email", "email"), ("password", "password")];

#[derive(Debug, Validate)]
struct LoginForm {
    #[validate(email(message = "Email no es válido."))]
    email: String,

    #[validate(length(min = 1, message = "Contraseña es requerida."))]
    password: String,
}

impl From<LoginRequest> for LoginForm {
    fn from(req: LoginRequest) -> Self {
        Self {
            email: req.email.unwrap_or_default().trim().to_string(),
            password: req.password.unwrap_or_default(),
        }
    }
}

/// First message per field, ordered by `fields`.
fn field_errors(errors: &ValidationErrors, fields: &[(&str, &str)]) -> Vec<FieldError> {
    let by_field = errors.field_errors();
    fields
        .iter()
        .filter_map(|&(field, param)| {
            let first = by_field.get(field)?.first()?;
            let msg = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some(FieldError::new(param, msg))
        })
        .collect()
}

fn validate_signup(req: SignupRequest) -> Result<ValidSignup, ApiError> {
    let form = SignupForm::from(req);
    form.validate()
        .map_err(|e| ApiError::validation(field_errors(&e, &SIGNUP_FIELDS)))?;

    Ok(ValidSignup {
        first_name: form.first_name.unwrap_or_default(),
        last_name: form.last_name.unwrap_or_default(),
        email: form.email.unwrap_or_default(),
        role: form.role.parse().unwrap_or_default(),
        password: form.password,
    })
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Identity of the caller, from a verified bearer token.
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidToken(MISSING_TOKEN.to_string()))?;

        state.auth.resolve_identity(token).map(AuthUser)
    }
}

/// `axum::Json` whose rejection renders as an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
