pub mod categories;
pub mod comments;
pub mod error;
mod mapping;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod reactions;
pub mod users;

pub use error::{Result, StoreError};
pub use models::{DbOptions, TableCounts};
pub use posts::PostStore;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Blog database with a reader/writer split.
///
/// All mutations go through the single writer; reads are spread round-robin
/// over read-only connections to the same file.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path, options: &DbOptions) -> Result<Self> {
        let writer = Connection::open(path)?;
        writer.busy_timeout(options.busy_timeout)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        // Cascading deletes depend on this
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        let reader_count = options.readers.max(1);
        let mut readers = Vec::with_capacity(reader_count);
        for _ in 0..reader_count {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(options.busy_timeout)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            reader_count
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run `f` against the next read-only connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("reader: {}", e)))?;
        f(&conn)
    }

    /// Run `f` against the writer connection.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("writer: {}", e)))?;
        f(&conn)
    }

    pub fn posts(&self) -> PostStore<'_> {
        PostStore::new(self)
    }

    /// Drop every table, then re-create the schema and seed rows.
    pub fn reset(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            migrations::drop_all(conn)?;
            migrations::run(conn)
        })?;
        info!("Database reset");
        Ok(())
    }

    pub fn counts(&self) -> Result<TableCounts> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM user),
                    (SELECT COUNT(*) FROM category),
                    (SELECT COUNT(*) FROM post),
                    (SELECT COUNT(*) FROM comment),
                    (SELECT COUNT(*) FROM user_reactions)",
                [],
                |row| {
                    Ok(TableCounts {
                        users: row.get(0)?,
                        categories: row.get(1)?,
                        posts: row.get(2)?,
                        comments: row.get(3)?,
                        reactions: row.get(4)?,
                    })
                },
            )?;
            Ok(counts)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");

        {
            let db = Database::open(&path, &DbOptions::default()).unwrap();
            add_user(&db, "u1");
        }

        let db = Database::open(&path, &DbOptions::default()).unwrap();
        assert_eq!(db.counts().unwrap().users, 1);
    }

    #[test]
    fn reset_clears_rows_and_reseeds() {
        let (_dir, db) = open_temp();
        add_user(&db, "u1");
        let cat = add_category(&db, "rust");
        db.posts().create(&new_post("u1", cat, "Hello", at(9, 0))).unwrap();

        db.reset().unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts, TableCounts::default());

        let roles: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM role", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(roles, 3);
    }

    #[test]
    fn zero_readers_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let options = DbOptions {
            readers: 0,
            ..Default::default()
        };
        let db = Database::open(&dir.path().join("blog.db"), &options).unwrap();
        assert_eq!(db.counts().unwrap().posts, 0);
    }
}
