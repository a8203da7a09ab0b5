//! v001 -- Initial schema creation.
//!
//! Creates the `users` (credential store) and `products` tables.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id             TEXT PRIMARY KEY NOT NULL,          -- UUID v4
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE, -- stored trimmed + lower-cased
    password_hash  TEXT NOT NULL,                      -- bcrypt, never served
    role           TEXT NOT NULL DEFAULT 'User'
                   CHECK (role IN ('User', 'Seller', 'Admin')),
    email_verified INTEGER NOT NULL DEFAULT 0,         -- boolean 0/1
    created_at     TEXT NOT NULL,                      -- RFC-3339
    updated_at     TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Products
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id          TEXT PRIMARY KEY NOT NULL,             -- UUID v4
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    meta        TEXT NOT NULL DEFAULT '',
    category    TEXT NOT NULL,
    material    TEXT NOT NULL,
    price       REAL NOT NULL CHECK (price >= 0),
    stock       INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    images      TEXT NOT NULL DEFAULT '[]',            -- JSON array of URLs
    seller_id   TEXT NOT NULL,                         -- FK -> users(id)
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,

    FOREIGN KEY (seller_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_products_seller     ON products(seller_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_products_category   ON products(category);
CREATE INDEX IF NOT EXISTS idx_products_material   ON products(material);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
