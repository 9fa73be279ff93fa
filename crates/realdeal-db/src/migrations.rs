use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Reference categories. Fixed ids keep re-seeding idempotent.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("00000000-0000-0000-0000-000000000001", "Electronics"),
    ("00000000-0000-0000-0000-000000000002", "Clothing & Fashion"),
    ("00000000-0000-0000-0000-000000000003", "Home & Garden"),
    ("00000000-0000-0000-0000-000000000004", "Sports & Leisure"),
    ("00000000-0000-0000-0000-000000000005", "Vehicles"),
    ("00000000-0000-0000-0000-000000000006", "Real Estate"),
    ("00000000-0000-0000-0000-000000000007", "Jobs"),
    ("00000000-0000-0000-0000-000000000008", "Services"),
    ("00000000-0000-0000-0000-000000000009", "Other"),
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                email               TEXT NOT NULL UNIQUE COLLATE NOCASE,
                name                TEXT NOT NULL,
                password            TEXT NOT NULL,
                phone               TEXT,
                is_verified         INTEGER NOT NULL DEFAULT 0,
                verification_level  TEXT NOT NULL DEFAULT 'NONE',
                created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE categories (
                id      TEXT PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE listings (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                price        REAL NOT NULL,
                images       TEXT NOT NULL DEFAULT '[]',
                condition    TEXT NOT NULL,
                location     TEXT NOT NULL,
                is_active    INTEGER NOT NULL DEFAULT 1,
                is_sold      INTEGER NOT NULL DEFAULT 0,
                seller_id    TEXT NOT NULL REFERENCES users(id),
                category_id  TEXT NOT NULL REFERENCES categories(id),
                created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_listings_seller ON listings(seller_id);
            CREATE INDEX idx_listings_category ON listings(category_id);

            CREATE TABLE chats (
                id          TEXT PRIMARY KEY,
                listing_id  TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                buyer_id    TEXT NOT NULL REFERENCES users(id),
                seller_id   TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(listing_id, buyer_id, seller_id)
            );

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                chat_id     TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                sender_id   TEXT NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_messages_chat ON messages(chat_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    // Reference data is re-applied on every start; existing rows are kept.
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO categories (id, name) VALUES (?1, ?2)")?;
    for (id, name) in CATEGORIES {
        stmt.execute((id, name))?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let categories: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(categories as usize, CATEGORIES.len());

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
