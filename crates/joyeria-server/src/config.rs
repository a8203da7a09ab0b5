//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use joyeria_shared::constants::{
    DEFAULT_CATEGORIES, DEFAULT_HTTP_PORT, DEFAULT_MATERIALS, DEFAULT_TOKEN_TTL_SECS,
    PRODUCT_LIST_LIMIT,
};

/// Costs accepted by bcrypt.
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// A configuration value that must never reach the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API server.
    /// Env: `HTTP_ADDR`, or `PORT` to change only the port.
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./joyeria.db`
    pub database_path: PathBuf,

    /// Token signing secret.
    /// Env: `JWT_SECRET`
    /// Default: none; a random per-process secret is generated at startup.
    pub jwt_secret: Option<Secret>,

    /// Bearer token lifetime.
    /// Env: `JWT_EXPIRES_IN` (`30s`, `15m`, `12h`, `7d` or bare seconds)
    /// Default: 7 days
    pub token_ttl: Duration,

    /// Allowed cross-origin sources, `*` for any.
    /// Env: `CORS_ORIGIN` (comma-separated)
    /// Default: `*`
    pub cors_origin: String,

    /// Rate-limit window.
    /// Env: `RATE_WINDOW_MS`
    /// Default: 60 000 ms
    pub rate_window: Duration,

    /// Requests allowed per window per client IP.
    /// Env: `RATE_MAX`
    /// Default: `80`
    pub rate_max: u32,

    /// bcrypt cost factor for password hashes.
    /// Env: `BCRYPT_COST`
    /// Default: `10`
    pub bcrypt_cost: u32,

    /// Whether signup honors a caller-supplied role. When disabled every new
    /// account is a plain `User`.
    /// Env: `OPEN_ROLE_SIGNUP` (true/false)
    /// Default: `true`
    pub open_role_signup: bool,

    /// Closed set of product categories.
    /// Env: `CATALOG_CATEGORIES` (comma-separated)
    pub categories: Vec<String>,

    /// Closed set of product materials.
    /// Env: `CATALOG_MATERIALS` (comma-separated)
    pub materials: Vec<String>,

    /// Upper bound on products returned by one list call.
    /// Env: `PRODUCT_LIST_LIMIT`
    /// Default: `200`
    pub product_list_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./joyeria.db"),
            jwt_secret: None,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS as u64),
            cors_origin: "*".to_string(),
            rate_window: Duration::from_millis(60_000),
            rate_max: 80,
            bcrypt_cost: 10,
            open_role_signup: true,
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            materials: DEFAULT_MATERIALS.iter().map(|s| s.to_string()).collect(),
            product_list_limit: PRODUCT_LIST_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => config.http_addr.set_port(p),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, ignoring"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = Some(Secret::new(secret));
            }
        }

        if let Some(raw) = lookup("JWT_EXPIRES_IN") {
            match parse_duration(&raw) {
                Some(ttl) => config.token_ttl = ttl,
                None => tracing::warn!(value = %raw, "Invalid JWT_EXPIRES_IN, using default"),
            }
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            if !origin.trim().is_empty() {
                config.cors_origin = origin.trim().to_string();
            }
        }

        if let Some(ms) = lookup("RATE_WINDOW_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            if ms > 0 {
                config.rate_window = Duration::from_millis(ms);
            }
        }

        if let Some(max) = lookup("RATE_MAX").and_then(|v| v.trim().parse::<u32>().ok()) {
            if max > 0 {
                config.rate_max = max;
            }
        }

        if let Some(raw) = lookup("BCRYPT_COST") {
            match raw.trim().parse::<u32>() {
                Ok(cost) if BCRYPT_COST_RANGE.contains(&cost) => {
                    config.bcrypt_cost = cost
                }
                _ => tracing::warn!(value = %raw, "Invalid BCRYPT_COST, using default"),
            }
        }

        if let Some(val) = lookup("OPEN_ROLE_SIGNUP") {
            config.open_role_signup = val != "false" && val != "0";
        }

        if let Some(list) = lookup("CATALOG_CATEGORIES").and_then(|v| parse_list(&v)) {
            config.categories = list;
        }

        if let Some(list) = lookup("CATALOG_MATERIALS").and_then(|v| parse_list(&v)) {
            config.materials = list;
        }

        if let Some(limit) = lookup("PRODUCT_LIST_LIMIT").and_then(|v| v.trim().parse::<usize>().ok()) {
            if limit > 0 {
                config.product_list_limit = limit;
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse `30s`, `15m`, `12h`, `7d` or bare seconds.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        _ => (raw, 's'),
    };
    let n: u64 = digits.trim().parse().ok()?;
    let secs = match unit {
        's' => n,
        'm' => n.checked_mul(60)?,
        'h' => n.checked_mul(60 * 60)?,
        'd' => n.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Random signing secret for runs without `JWT_SECRET`. Tokens do not survive
/// a restart.
pub fn ephemeral_secret() -> Secret {
    let bytes: [u8; 32] = rand::random();
    Secret::new(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 5000).into());
        assert_eq!(config.rate_max, 80);
        assert_eq!(config.product_list_limit, 200);
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.categories.len(), 4);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_with(&[
            ("PORT", "8081"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRES_IN", "12h"),
            ("RATE_WINDOW_MS", "1000"),
            ("RATE_MAX", "5"),
            ("OPEN_ROLE_SIGNUP", "false"),
            ("CATALOG_CATEGORIES", "Anillos, Relojes ,"),
        ]);
        assert_eq!(config.http_addr.port(), 8081);
        assert_eq!(config.jwt_secret.as_ref().unwrap().expose(), "s3cret");
        assert_eq!(config.token_ttl, Duration::from_secs(12 * 3600));
        assert_eq!(config.rate_window, Duration::from_secs(1));
        assert_eq!(config.rate_max, 5);
        assert!(!config.open_role_signup);
        assert_eq!(config.categories, vec!["Anillos", "Relojes"]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_with(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("BCRYPT_COST", "99"),
            ("JWT_EXPIRES_IN", "7w"),
        ]);
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.token_ttl, ServerConfig::default().token_ttl);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("7d"), Some(Duration::from_secs(604_800)));
        assert_eq!(parse_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_duration("3600"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("0"), None);
        assert_eq!(parse_duration("abc"), None);
    }

    #[test]
    fn test_secret_is_redacted() {
        let rendered = format!("{:?}", Secret::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(ephemeral_secret().expose().len(), 64);
    }
}
