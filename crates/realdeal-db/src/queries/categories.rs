use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::CategoryRow;

impl Database {
    /// All categories, sorted by name.
    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE")?;
            let rows = stmt
                .query_map([], |row| Ok(CategoryRow { id: row.get(0)?, name: row.get(1)? }))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_category(&self, id: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT id, name FROM categories WHERE id = ?1", [id], |row| {
                Ok(CategoryRow { id: row.get(0)?, name: row.get(1)? })
            })
            .optional()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::CATEGORIES;

    #[test]
    fn categories_come_back_sorted() {
        let db = Database::open_in_memory().unwrap();
        let names: Vec<String> = db.list_categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names.len(), CATEGORIES.len());
        let mut sorted = names.clone();
        sorted.sort_by_key(|n| n.to_lowercase());
        assert_eq!(names, sorted);
        assert_eq!(names.first().map(String::as_str), Some("Clothing & Fashion"));
    }

    #[test]
    fn unknown_category_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_category("missing").unwrap().is_none());
        assert!(db.get_category(CATEGORIES[0].0).unwrap().is_some());
    }
}
