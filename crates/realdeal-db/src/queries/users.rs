use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::{NewUser, UserRow};

const USER_COLUMNS: &str =
    "id, email, name, password, phone, is_verified, verification_level, created_at, updated_at";

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        let now = crate::timestamp_now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password, phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![user.id, user.email, user.name, user.password_hash, user.phone, now],
            )?;
            Ok(())
        })
    }

    /// Email lookup is case-insensitive (the column is `COLLATE NOCASE`).
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password: row.get(3)?,
        phone: row.get(4)?,
        is_verified: row.get(5)?,
        verification_level: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_lookup_ignores_case() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&NewUser {
            id: "u1",
            email: "Jane.Smith@example.com",
            name: "Jane",
            password_hash: "x",
            phone: None,
        })
        .unwrap();

        let user = db.get_user_by_email("jane.smith@EXAMPLE.com").unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.verification_level, "NONE");
        assert!(!user.is_verified);
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = NewUser { id: "u1", email: "a@b.c", name: "A", password_hash: "x", phone: None };
        db.create_user(&user).unwrap();
        let dup = NewUser { id: "u2", email: "A@B.C", ..user };
        assert!(db.create_user(&dup).is_err());
    }
}
