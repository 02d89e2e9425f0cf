use blog_types::Category;
use rusqlite::params;
use tracing::debug;

use crate::mapping::map_category;
use crate::{Database, Result};

impl Database {
    pub fn create_category(&self, name: &str, name_code: &str, description: &str) -> Result<i64> {
        let id = self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO category (name, name_code, description) VALUES (?1, ?2, ?3)",
                params![name, name_code, description],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(category_id = id, name_code, "Category created");
        Ok(id)
    }

    pub fn get_category(&self, id: i64) -> Result<Category> {
        self.with_conn(|conn| {
            let category = conn
                .prepare_cached(
                    "SELECT id, name, name_code, description FROM category WHERE id = ?1",
                )?
                .query_row([id], map_category)?;
            Ok(category)
        })
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, name, name_code, description FROM category ORDER BY id",
            )?;
            let categories = stmt
                .query_map([], map_category)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    /// Removes the category and every post filed under it as primary category.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let affected = self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM category WHERE id = ?1", [id])?)
        })?;
        debug!(category_id = id, affected, "Category deleted");
        Ok(())
    }
}
