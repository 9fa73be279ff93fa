use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{OptionalExt, decode_images, encode_images};
use crate::Database;
use crate::models::{ListingFilter, ListingPatch, ListingRow, NewListing};

const LISTING_SELECT: &str = "
    SELECT l.id, l.title, l.description, l.price, l.images, l.condition, l.location,
           l.is_active, l.is_sold, l.category_id, c.name, l.seller_id, u.name, u.email,
           u.is_verified, l.created_at, l.updated_at
    FROM listings l
    JOIN categories c ON c.id = l.category_id
    JOIN users u ON u.id = l.seller_id";

impl Database {
    pub fn create_listing(&self, listing: &NewListing<'_>) -> Result<()> {
        let images = encode_images(listing.images)?;
        let now = crate::timestamp_now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO listings
                    (id, title, description, price, images, condition, location,
                     seller_id, category_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                rusqlite::params![
                    listing.id,
                    listing.title,
                    listing.description,
                    listing.price,
                    images,
                    listing.condition,
                    listing.location,
                    listing.seller_id,
                    listing.category_id,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{LISTING_SELECT} WHERE l.id = ?1"))?;
            stmt.query_row([id], map_listing).optional()
        })
    }

    /// Listings matching every set field of `filter`, newest first.
    pub fn find_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| query_listings(conn, filter))
    }

    /// Applies `patch`; returns false when no listing has that id.
    pub fn update_listing(&self, id: &str, patch: &ListingPatch) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            sets.push("title = ?");
            params.push(Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            params.push(Value::Text(description.clone()));
        }
        if let Some(price) = patch.price {
            sets.push("price = ?");
            params.push(Value::Real(price));
        }
        if let Some(images) = &patch.images {
            sets.push("images = ?");
            params.push(Value::Text(encode_images(images)?));
        }
        if let Some(condition) = &patch.condition {
            sets.push("condition = ?");
            params.push(Value::Text(condition.clone()));
        }
        if let Some(location) = &patch.location {
            sets.push("location = ?");
            params.push(Value::Text(location.clone()));
        }
        if let Some(category_id) = &patch.category_id {
            sets.push("category_id = ?");
            params.push(Value::Text(category_id.clone()));
        }
        if let Some(is_active) = patch.is_active {
            sets.push("is_active = ?");
            params.push(Value::Integer(is_active.into()));
        }
        if let Some(is_sold) = patch.is_sold {
            sets.push("is_sold = ?");
            params.push(Value::Integer(is_sold.into()));
        }

        sets.push("updated_at = ?");
        params.push(Value::Text(crate::timestamp_now()));
        params.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE listings SET {} WHERE id = ?", sets.join(", "));
        self.with_conn_mut(|conn| {
            let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
            Ok(changed > 0)
        })
    }

    /// Deletes the listing; its chats and their messages go with it.
    pub fn delete_listing(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM listings WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_listings(conn: &Connection, filter: &ListingFilter) -> Result<Vec<ListingRow>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if !filter.include_inactive {
        clauses.push("l.is_active = 1");
    }
    if let Some(category) = &filter.category {
        clauses.push("lower(c.name) = lower(?)");
        params.push(Value::Text(category.clone()));
    }
    if let Some(category_id) = &filter.category_id {
        clauses.push("l.category_id = ?");
        params.push(Value::Text(category_id.clone()));
    }
    if let Some(min) = filter.min_price {
        clauses.push("l.price >= ?");
        params.push(Value::Real(min));
    }
    if let Some(max) = filter.max_price {
        clauses.push("l.price <= ?");
        params.push(Value::Real(max));
    }
    if let Some(condition) = &filter.condition {
        clauses.push("lower(l.condition) = lower(?)");
        params.push(Value::Text(condition.clone()));
    }
    if let Some(seller_id) = &filter.seller_id {
        clauses.push("l.seller_id = ?");
        params.push(Value::Text(seller_id.clone()));
    }
    if let Some(search) = &filter.search {
        // instr() rather than LIKE so '%' and '_' in the term match literally
        clauses.push("(instr(lower(l.title), lower(?)) > 0 OR instr(lower(l.description), lower(?)) > 0)");
        params.push(Value::Text(search.clone()));
        params.push(Value::Text(search.clone()));
    }

    let mut sql = LISTING_SELECT.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY l.created_at DESC, l.rowid DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit.into()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), map_listing)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_listing(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        images: decode_images(4, row.get(4)?)?,
        condition: row.get(5)?,
        location: row.get(6)?,
        is_active: row.get(7)?,
        is_sold: row.get(8)?,
        category_id: row.get(9)?,
        category_name: row.get(10)?,
        seller_id: row.get(11)?,
        seller_name: row.get(12)?,
        seller_email: row.get(13)?,
        seller_is_verified: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::CATEGORIES;
    use crate::models::NewUser;

    const ELECTRONICS: &str = CATEGORIES[0].0;
    const HOME: &str = CATEGORIES[2].0;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        for (id, email) in [("alice", "alice@example.com"), ("bob", "bob@example.com")] {
            db.create_user(&NewUser { id, email, name: id, password_hash: "x", phone: None })
                .unwrap();
        }
        let images = vec!["/uploads/a.png".to_string()];
        let rows = [
            ("l1", "iPhone 12 Pro", 699.99, "Like New", "alice", ELECTRONICS),
            ("l2", "Wooden Desk", 299.5, "Good", "alice", HOME),
            ("l3", "MacBook Pro", 1500.0, "like new", "bob", ELECTRONICS),
        ];
        for (id, title, price, condition, seller_id, category_id) in rows {
            db.create_listing(&NewListing {
                id,
                title,
                description: "described",
                price,
                images: &images,
                condition,
                location: "Zagreb",
                seller_id,
                category_id,
            })
            .unwrap();
        }
        db
    }

    fn ids(rows: Vec<ListingRow>) -> Vec<String> {
        let mut ids: Vec<String> = rows.into_iter().map(|r| r.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn filters_by_category_name_and_price() {
        let db = setup();
        let filter = ListingFilter {
            category: Some("electronics".into()),
            max_price: Some(1000.0),
            ..Default::default()
        };
        assert_eq!(ids(db.find_listings(&filter).unwrap()), vec!["l1"]);

        let filter = ListingFilter { min_price: Some(299.5), ..Default::default() };
        assert_eq!(ids(db.find_listings(&filter).unwrap()), vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn filters_by_condition_seller_and_search() {
        let db = setup();
        let filter = ListingFilter { condition: Some("LIKE NEW".into()), ..Default::default() };
        assert_eq!(ids(db.find_listings(&filter).unwrap()), vec!["l1", "l3"]);

        let filter = ListingFilter { seller_id: Some("alice".into()), ..Default::default() };
        assert_eq!(ids(db.find_listings(&filter).unwrap()), vec!["l1", "l2"]);

        let filter = ListingFilter { search: Some("macbook".into()), ..Default::default() };
        assert_eq!(ids(db.find_listings(&filter).unwrap()), vec!["l3"]);
    }

    #[test]
    fn limit_and_newest_first() {
        let db = setup();
        let filter = ListingFilter { limit: Some(2), ..Default::default() };
        let rows = db.find_listings(&filter).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "l3");
    }

    #[test]
    fn inactive_listings_are_hidden_unless_requested() {
        let db = setup();
        let patch = ListingPatch { is_active: Some(false), ..Default::default() };
        assert!(db.update_listing("l2", &patch).unwrap());

        assert_eq!(ids(db.find_listings(&ListingFilter::default()).unwrap()), vec!["l1", "l3"]);
        let all = ListingFilter { include_inactive: true, ..Default::default() };
        assert_eq!(ids(db.find_listings(&all).unwrap()), vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn marking_sold_is_visible_on_reread() {
        let db = setup();
        let patch = ListingPatch { is_sold: Some(true), ..Default::default() };
        assert!(db.update_listing("l1", &patch).unwrap());

        let listing = db.get_listing("l1").unwrap().unwrap();
        assert!(listing.is_sold);
        assert!(listing.is_active);
        assert_eq!(listing.title, "iPhone 12 Pro");
    }

    #[test]
    fn patch_updates_only_given_columns() {
        let db = setup();
        let patch = ListingPatch {
            price: Some(650.0),
            images: Some(vec!["/uploads/b.png".into(), "/uploads/c.png".into()]),
            ..Default::default()
        };
        db.update_listing("l1", &patch).unwrap();

        let listing = db.get_listing("l1").unwrap().unwrap();
        assert_eq!(listing.price, 650.0);
        assert_eq!(listing.images, vec!["/uploads/b.png", "/uploads/c.png"]);
        assert_eq!(listing.condition, "Like New");
        assert_eq!(listing.category_name, "Electronics");
        assert_eq!(listing.seller_email, "alice@example.com");
    }

    #[test]
    fn update_and_delete_report_missing_rows() {
        let db = setup();
        let patch = ListingPatch { title: Some("x".into()), ..Default::default() };
        assert!(!db.update_listing("nope", &patch).unwrap());
        assert!(db.delete_listing("l2").unwrap());
        assert!(!db.delete_listing("l2").unwrap());
        assert!(db.get_listing("l2").unwrap().is_none());
    }
}
