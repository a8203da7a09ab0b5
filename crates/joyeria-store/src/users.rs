//! CRUD operations for [`UserRecord`] records.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use joyeria_shared::policy::normalize_email;
use joyeria_shared::Role;

use crate::database::{
    conversion_error, decode_ts, encode_ts, is_unique_violation, timestamp_now, Database,
};
use crate::error::{Result, StoreError};
use crate::models::{NewUser, UserRecord};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, \
                            email_verified, created_at, updated_at";

impl Database {
    /// Insert a new account.
    ///
    /// There is no prior existence check: the `UNIQUE COLLATE NOCASE`
    /// constraint on `email` is authoritative, and its violation is reported
    /// as [`StoreError::Duplicate`]`("email")`.
    pub fn create_user(&self, new: &NewUser) -> Result<UserRecord> {
        let now = timestamp_now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            email: normalize_email(&new.email),
            password_hash: new.password_hash.clone(),
            role: new.role,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };

        self.conn()
            .execute(
                "INSERT INTO users (id, first_name, last_name, email, password_hash, role,
                                    email_verified, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.to_string(),
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.email_verified,
                    encode_ts(&user.created_at),
                    encode_ts(&user.updated_at),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate("email")
                } else {
                    StoreError::Sqlite(e)
                }
            })?;

        tracing::debug!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Look up an account by email (trimmed, case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let user = self
            .conn()
            .query_row(&sql, params![normalize_email(email)], row_to_user)
            .optional()?;
        Ok(user)
    }

    /// Fetch a single account by id.
    pub fn get_user(&self, id: Uuid) -> Result<UserRecord> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        self.conn()
            .query_row(&sql, params![id.to_string()], row_to_user)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(5)?;
    let created_str: String = row.get(7)?;
    let updated_str: String = row.get(8)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let role: Role = role_str.parse().map_err(|e| conversion_error(5, e))?;

    Ok(UserRecord {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        role,
        email_verified: row.get(6)?,
        created_at: decode_ts(7, &created_str)?,
        updated_at: decode_ts(8, &updated_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: " Ana ".into(),
            last_name: "Mora".into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
            role: Role::Seller,
        }
    }

    #[test]
    fn test_create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(&new_user("  Ana@Example.com ")).unwrap();
        assert_eq!(created.email, "ana@example.com");
        assert_eq!(created.first_name, "Ana");
        assert!(!created.email_verified);

        let fetched = db.get_user(created.id).unwrap();
        assert_eq!(fetched, created);

        let by_email = db.find_user_by_email("ANA@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.role, Role::Seller);
    }

    #[test]
    fn test_duplicate_email_is_rejected_by_the_schema() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("ana@example.com")).unwrap();

        let err = db.create_user(&new_user(" ANA@EXAMPLE.COM")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_user(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
        assert!(db.find_user_by_email("nadie@example.com").unwrap().is_none());
    }

    #[test]
    fn test_public_projection_has_no_hash() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("ana@example.com")).unwrap();
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["firstName"], "Ana");
    }
}
