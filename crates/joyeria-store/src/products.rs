//! CRUD operations for [`Product`] records.

use rusqlite::params;
use rusqlite::types::Value;
use uuid::Uuid;

use crate::database::{conversion_error, decode_ts, encode_ts, Database};
use crate::error::{Result, StoreError};
use crate::models::{Product, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, name, description, meta, category, material, price, stock, \
                               images, seller_id, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new product.
    pub fn insert_product(&self, product: &Product) -> Result<()> {
        self.conn().execute(
            "INSERT INTO products (id, name, description, meta, category, material, price,
                                   stock, images, seller_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                product.id.to_string(),
                product.name,
                product.description,
                product.meta,
                product.category,
                product.material,
                product.price,
                product.stock,
                serde_json::to_string(&product.images)?,
                product.seller.to_string(),
                encode_ts(&product.created_at),
                encode_ts(&product.updated_at),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single product by id.
    pub fn get_product(&self, id: Uuid) -> Result<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        self.conn()
            .query_row(&sql, params![id.to_string()], row_to_product)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List products matching `filter`, newest first, at most `limit` rows.
    pub fn list_products(&self, filter: &ProductFilter, limit: usize) -> Result<Vec<Product>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(category) = &filter.category {
            clauses.push("category = ?");
            values.push(Value::Text(category.clone()));
        }
        if let Some(material) = &filter.material {
            clauses.push("material = ?");
            values.push(Value::Text(material.clone()));
        }
        if let Some(seller) = &filter.seller {
            clauses.push("seller_id = ?");
            values.push(Value::Text(seller.to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {where_sql}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_product)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist the mutable columns of `product`. `seller_id` and
    /// `created_at` are never written.
    pub fn update_product(&self, product: &Product) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE products
             SET name = ?2, description = ?3, meta = ?4, category = ?5, material = ?6,
                 price = ?7, stock = ?8, images = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                product.id.to_string(),
                product.name,
                product.description,
                product.meta,
                product.category,
                product.material,
                product.price,
                product.stock,
                serde_json::to_string(&product.images)?,
                encode_ts(&product.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a product by id. Returns `true` if a row was deleted.
    pub fn delete_product(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM products WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Product`].
fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let id_str: String = row.get(0)?;
    let images_json: String = row.get(8)?;
    let seller_str: String = row.get(9)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let images: Vec<String> =
        serde_json::from_str(&images_json).map_err(|e| conversion_error(8, e))?;
    let seller = Uuid::parse_str(&seller_str).map_err(|e| conversion_error(9, e))?;

    Ok(Product {
        id,
        name: row.get(1)?,
        description: row.get(2)?,
        meta: row.get(3)?,
        category: row.get(4)?,
        material: row.get(5)?,
        price: row.get(6)?,
        stock: row.get(7)?,
        images,
        seller,
        created_at: decode_ts(10, &created_str)?,
        updated_at: decode_ts(11, &updated_str)?,
    })
}
