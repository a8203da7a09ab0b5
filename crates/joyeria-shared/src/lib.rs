//! # joyeria-shared
//!
//! Types shared by the storefront server and its client: the user and product
//! wire models, request/response bodies, bearer-token claims and the input
//! policies (email, password) both sides agree on.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod policy;
pub mod protocol;
pub mod types;

pub use catalog::{
    ImageList, NumberLike, PriceRange, Product, ProductInput, ProductQuery, PRICE_RANGES,
};
pub use error::{FieldError, SharedError};
pub use types::{Claims, Identity, PublicUser, Role};
