//! v002 -- Reject any attempt to reassign a product's seller.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS products_seller_immutable
BEFORE UPDATE OF seller_id ON products
WHEN NEW.seller_id <> OLD.seller_id
BEGIN
    SELECT RAISE(ABORT, 'products.seller_id is immutable');
END;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
