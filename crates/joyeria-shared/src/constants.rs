/// Application name
pub const APP_NAME: &str = "Joyería";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default product categories (closed set, configurable on the server)
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Anillos", "Collares", "Pendientes", "Otros"];

/// Default product materials (closed set, configurable on the server)
pub const DEFAULT_MATERIALS: [&str; 4] = ["Bronce", "Plata", "Oro", "Otro"];

/// Material assigned when a product is created without one
pub const DEFAULT_MATERIAL: &str = "Plata";

/// Stock assigned when a product is created without one
pub const DEFAULT_STOCK: i64 = 1;

/// Maximum number of products returned by a list call
pub const PRODUCT_LIST_LIMIT: usize = 200;

/// Product name bounds (characters, after trimming)
pub const PRODUCT_NAME_MIN: usize = 2;
pub const PRODUCT_NAME_MAX: usize = 120;

/// Maximum length of first / last names
pub const PERSON_NAME_MAX: usize = 80;

/// Minimum password length
pub const PASSWORD_MIN_LEN: usize = 8;

/// Default bearer token lifetime, in seconds (7 days)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
