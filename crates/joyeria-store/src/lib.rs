//! # joyeria-store
//!
//! Persistence for the storefront, backed by SQLite.
//!
//! The crate plays two roles: the credential store (user accounts with salted
//! password hashes) and the product document store. It exposes a synchronous
//! `Database` handle that wraps a `rusqlite::Connection` and provides typed
//! CRUD helpers for every model. Email uniqueness and seller immutability are
//! enforced by the schema itself, not by callers.

pub mod database;
pub mod migrations;
pub mod models;
pub mod products;
pub mod users;

mod error;

pub use database::{timestamp_now, Database};
pub use error::{Result, StoreError};
pub use models::*;
