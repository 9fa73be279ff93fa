//! Demo marketplace content for local development.

use anyhow::Result;
use tracing::info;

use crate::Database;
use crate::migrations::CATEGORIES;

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder-image.svg";

/// (id, email, name, phone, verification level)
pub const DEMO_USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("00000000-0000-0000-0001-000000000001", "john.doe@example.com", "John Doe", "+385 91 234 5678", "BASIC"),
    ("00000000-0000-0000-0001-000000000002", "jane.smith@example.com", "Jane Smith", "+385 95 876 5432", "FULL"),
    ("00000000-0000-0000-0001-000000000003", "demo@example.com", "Demo User", "+385 99 111 2222", "NONE"),
];

struct DemoListing {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    price: f64,
    category: usize,
    condition: &'static str,
    location: &'static str,
}

const DEMO_LISTINGS: &[DemoListing] = &[
    DemoListing {
        id: "00000000-0000-0000-0002-000000000001",
        title: "iPhone 12 Pro - Mint Condition",
        description: "Selling my iPhone 12 Pro 128GB in excellent condition. Comes with original box, charger, and a silicone case. Battery health at 91%.",
        price: 699.99,
        category: 0,
        condition: "Like New",
        location: "Zagreb",
    },
    DemoListing {
        id: "00000000-0000-0000-0002-000000000002",
        title: "Vintage Wooden Desk",
        description: "Beautiful solid oak desk from the 1970s. Some minor signs of use but in excellent overall condition. Dimensions: 120x60x75cm.",
        price: 299.50,
        category: 2,
        condition: "Good",
        location: "Split",
    },
    DemoListing {
        id: "00000000-0000-0000-0002-000000000003",
        title: "Mountain Bike - Trek Marlin 7",
        description: "Trek Marlin 7 mountain bike, size L. Bought last year, lightly used. Perfect for beginners and intermediate riders.",
        price: 650.0,
        category: 3,
        condition: "Like New",
        location: "Rijeka",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub users: usize,
    pub listings: usize,
    /// Rows actually written by this call; zero on a re-run.
    pub inserted: usize,
}

impl Database {
    /// Inserts the demo users and listings if they are not already present.
    /// All demo users share `password_hash`. Listings belong to the demo user.
    pub fn seed_demo_data(&self, password_hash: &str) -> Result<SeedSummary> {
        let images = serde_json::to_string(&[PLACEHOLDER_IMAGE])?;
        let now = crate::timestamp_now();

        let inserted = self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut inserted = 0;

            for (id, email, name, phone, level) in DEMO_USERS {
                inserted += tx.execute(
                    "INSERT OR IGNORE INTO users
                        (id, email, name, password, phone, is_verified, verification_level, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    rusqlite::params![id, email, name, password_hash, phone, *level != "NONE", level, now],
                )?;
            }

            // The demo address may already belong to a registered account
            let seller_id: String = tx.query_row(
                "SELECT id FROM users WHERE email = ?1",
                [DEMO_USERS[2].1],
                |row| row.get(0),
            )?;
            for listing in DEMO_LISTINGS {
                inserted += tx.execute(
                    "INSERT OR IGNORE INTO listings
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
                        seller_id,
                        CATEGORIES[listing.category].0,
                        now,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(inserted)
        })?;

        if inserted > 0 {
            info!("Seeded {} demo rows", inserted);
        }

        Ok(SeedSummary {
            categories: CATEGORIES.len(),
            users: DEMO_USERS.len(),
            listings: DEMO_LISTINGS.len(),
            inserted,
        })
    }
}
