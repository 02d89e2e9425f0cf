use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Schema, applied in order. Every statement is idempotent.
const MIGRATIONS: &[&str] = &[
    "
    CREATE TABLE IF NOT EXISTS permission (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        name_code   TEXT NOT NULL UNIQUE,
        description TEXT
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS role (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        name_code   TEXT NOT NULL UNIQUE,
        description TEXT
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS photo (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        upload_dt   TEXT NOT NULL DEFAULT (datetime('now')),
        path        TEXT NOT NULL,
        size_mb     REAL,
        format      TEXT
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS category (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        name_code   TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS user (
        id              TEXT PRIMARY KEY,
        username        TEXT NOT NULL UNIQUE,
        email           TEXT NOT NULL UNIQUE,
        password        TEXT NOT NULL,
        date_created    TEXT NOT NULL DEFAULT (datetime('now')),
        role_id         INTEGER REFERENCES role(id),
        permission_id   INTEGER REFERENCES permission(id),
        photo_id        INTEGER REFERENCES photo(id) ON DELETE SET NULL
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS session (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        expiry      TEXT NOT NULL
    );
    ",
    "
    CREATE TABLE IF NOT EXISTS post (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        title           TEXT NOT NULL,
        text            TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        like_count      INTEGER NOT NULL DEFAULT 0,
        dislike_count   INTEGER NOT NULL DEFAULT 0,
        comment_count   INTEGER NOT NULL DEFAULT 0,
        photo_id        INTEGER REFERENCES photo(id) ON DELETE SET NULL,
        category_id     INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_post_created
        ON post(created_at, id);
    CREATE INDEX IF NOT EXISTS idx_post_user
        ON post(user_id);
    ",
    "
    CREATE TABLE IF NOT EXISTS post_categories (
        post_id     INTEGER NOT NULL REFERENCES post(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
        PRIMARY KEY (post_id, category_id)
    );

    CREATE INDEX IF NOT EXISTS idx_post_categories_category
        ON post_categories(category_id);
    ",
    "
    CREATE TABLE IF NOT EXISTS comment (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id     INTEGER NOT NULL REFERENCES post(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        comment_dt  TEXT NOT NULL,
        comment     TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_comment_post
        ON comment(post_id);
    CREATE INDEX IF NOT EXISTS idx_comment_user
        ON comment(user_id);
    ",
    // One row per (post, user) is a caller-side rule, not a constraint.
    "
    CREATE TABLE IF NOT EXISTS user_reactions (
        post_id     INTEGER NOT NULL REFERENCES post(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
        reaction    INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_user_reactions_post
        ON user_reactions(post_id);
    ",
];

const SEEDS: &[&str] = &[
    "INSERT OR IGNORE INTO role (name, name_code, description)
        VALUES ('Admin', 'admin', 'Superuser administrator')",
    "INSERT OR IGNORE INTO role (name, name_code, description)
        VALUES ('Moderator', 'moderator', 'Site moderator: can control, read and write posts')",
    "INSERT OR IGNORE INTO role (name, name_code, description)
        VALUES ('User', 'user', 'Normal user: can only read and write posts')",
    "INSERT OR IGNORE INTO permission (name, name_code, description)
        VALUES ('Admin', 'admin', 'Allowed to control users and posts')",
    "INSERT OR IGNORE INTO permission (name, name_code, description)
        VALUES ('Moderator', 'moderator', 'Allowed to control, read and write posts')",
    "INSERT OR IGNORE INTO permission (name, name_code, description)
        VALUES ('User', 'user', 'Allowed to read and write posts')",
];

/// Dependents first, so no drop has to cascade.
const DROPS: &[&str] = &[
    "DROP TABLE IF EXISTS user_reactions",
    "DROP TABLE IF EXISTS comment",
    "DROP TABLE IF EXISTS post_categories",
    "DROP TABLE IF EXISTS post",
    "DROP TABLE IF EXISTS session",
    "DROP TABLE IF EXISTS user",
    "DROP TABLE IF EXISTS category",
    "DROP TABLE IF EXISTS photo",
    "DROP TABLE IF EXISTS role",
    "DROP TABLE IF EXISTS permission",
];

pub fn run(conn: &Connection) -> Result<()> {
    for sql in MIGRATIONS {
        conn.execute_batch(sql)?;
    }
    for sql in SEEDS {
        conn.execute(sql, [])?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// Destructive: removes every table and its rows.
pub fn drop_all(conn: &Connection) -> Result<()> {
    for sql in DROPS {
        conn.execute_batch(sql)?;
    }

    info!("Dropped {} tables", DROPS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn run_is_idempotent() {
        let conn = memory_conn();
        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(count(&conn, "role"), 3);
        assert_eq!(count(&conn, "permission"), 3);
    }

    #[test]
    fn seeds_admin_moderator_user() {
        let conn = memory_conn();
        run(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT name_code FROM role ORDER BY id")
            .unwrap();
        let codes: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(codes, ["admin", "moderator", "user"]);
    }

    #[test]
    fn drop_all_removes_tables() {
        let conn = memory_conn();
        run(&conn).unwrap();
        drop_all(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }
}
