//! # joyeria-client
//!
//! Headless client for the Joyería storefront. UI layers drive these types
//! and render their state:
//!
//! - [`api::ApiClient`] talks to the REST backend
//! - [`store::Store`] holds observable shared state ([`store::Session`],
//!   [`cart::Cart`])
//! - [`filter`] and [`url_state`] implement catalog filtering, paging and
//!   shareable filter URLs
//! - [`catalog::CatalogPage`] and [`seller::SellerForm`] are the page
//!   controllers

pub mod api;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod seller;
pub mod store;
pub mod url_state;

pub use api::ApiClient;
pub use cart::{Cart, CartEntry, CartItem};
pub use catalog::{CatalogPage, LoadOutcome};
pub use error::{CartError, ClientError};
pub use filter::{FilterSpec, PageView};
pub use seller::SellerForm;
pub use store::{Session, Store};
pub use url_state::UrlSync;
