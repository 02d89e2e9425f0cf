use blog_types::{NewPost, Post, Reaction};
use rusqlite::{Connection, named_params, params};
use tracing::debug;

use crate::mapping::{format_timestamp, map_post, map_post_bare};
use crate::{Database, Result, StoreError};

const SELECT_JOINED: &str = "
    SELECT p.id, p.user_id, p.title, p.text, p.created_at,
           p.like_count, p.dislike_count, p.comment_count, p.photo_id, p.category_id,
           u.username, u.email, u.photo_id,
           c.name, c.name_code, c.description
    FROM post AS p
    LEFT JOIN user AS u ON p.user_id = u.id
    LEFT JOIN category AS c ON p.category_id = c.id";

// Category columns come from the association, so a post filed under several
// categories reports the one that was asked for.
const SELECT_BY_CATEGORY: &str = "
    SELECT p.id, p.user_id, p.title, p.text, p.created_at,
           p.like_count, p.dislike_count, p.comment_count, p.photo_id, pc.category_id,
           u.username, u.email, u.photo_id,
           c.name, c.name_code, c.description
    FROM post_categories AS pc
    JOIN post AS p ON p.id = pc.post_id
    JOIN user AS u ON p.user_id = u.id
    JOIN category AS c ON pc.category_id = c.id
    WHERE pc.category_id = :category_id";

const SELECT_BARE: &str = "
    SELECT id, user_id, title, text, created_at,
           like_count, dislike_count, comment_count, photo_id, category_id
    FROM post
    WHERE id = :id";

const PAGINATE: &str = "ORDER BY p.created_at, p.id LIMIT :limit OFFSET :offset";

/// Append an optional filter and the pagination window to a select.
fn paginated(select: &str, filter: Option<&str>) -> String {
    match filter {
        Some(filter) => format!("{} WHERE {} {}", select, filter, PAGINATE),
        None => format!("{} {}", select, PAGINATE),
    }
}

pub(crate) const COMMENT_COUNT: &str = "comment_count";

/// Counter column for a reaction. With [`COMMENT_COUNT`], the only way a
/// column name reaches SQL text.
fn reaction_column(reaction: Reaction) -> &'static str {
    match reaction {
        Reaction::Like => "like_count",
        Reaction::Dislike => "dislike_count",
    }
}

/// Single-statement counter update by `delta`, floored at zero.
///
/// Errors with `NotFound` only when no post has `id`; hitting the floor
/// still matches the row and counts as success.
pub(crate) fn adjust_counter(
    conn: &Connection,
    id: i64,
    column: &'static str,
    delta: i64,
) -> Result<()> {
    let sql = format!("UPDATE post SET {0} = MAX({0} + ?2, 0) WHERE id = ?1", column);

    let affected = conn.prepare_cached(&sql)?.execute(params![id, delta])?;
    if affected == 0 {
        return Err(StoreError::NotFound);
    }

    debug!(post_id = id, column, delta, "Post counter adjusted");
    Ok(())
}

pub(crate) fn reaction_counter(
    conn: &Connection,
    id: i64,
    reaction: Reaction,
    delta: i64,
) -> Result<()> {
    adjust_counter(conn, id, reaction_column(reaction), delta)
}

/// Post operations over a [`Database`].
pub struct PostStore<'a> {
    pub(crate) db: &'a Database,
}

impl<'a> PostStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a post and file it under its category. Returns the new id.
    pub fn create(&self, post: &NewPost) -> Result<i64> {
        let created_at = format_timestamp(&post.created_at);

        let id = self.db.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                "INSERT INTO post (user_id, title, text, created_at, photo_id, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    post.user_id,
                    post.title,
                    post.text,
                    created_at,
                    post.photo_id,
                    post.category_id
                ],
            )?;
            if inserted == 0 {
                return Err(StoreError::NotInserted);
            }
            let id = tx.last_insert_rowid();

            tx.execute(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
                params![id, post.category_id],
            )?;

            tx.commit()?;
            Ok(id)
        })?;

        debug!(post_id = id, user_id = %post.user_id, "Post created");
        Ok(id)
    }

    /// Post with its author and category.
    pub fn get(&self, id: i64) -> Result<Post> {
        self.db.with_conn(|conn| {
            let sql = format!("{} WHERE p.id = :id", SELECT_JOINED);
            let post = conn
                .prepare_cached(&sql)?
                .query_row(named_params! { ":id": id }, map_post)?;
            Ok(post)
        })
    }

    /// Post row alone, without joins.
    pub fn get_bare(&self, id: i64) -> Result<Post> {
        self.db.with_conn(|conn| {
            let post = conn
                .prepare_cached(SELECT_BARE)?
                .query_row(named_params! { ":id": id }, map_post_bare)?;
            Ok(post)
        })
    }

    /// Oldest first, by creation time then id.
    pub fn get_latest(&self, offset: u32, limit: u32) -> Result<Vec<Post>> {
        self.db.with_conn(|conn| {
            let sql = paginated(SELECT_JOINED, None);
            let mut stmt = conn.prepare_cached(&sql)?;
            let posts = stmt
                .query_map(named_params! { ":limit": limit, ":offset": offset }, map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(posts)
        })
    }

    pub fn get_user_posts(&self, user_id: &str, offset: u32, limit: u32) -> Result<Vec<Post>> {
        self.db.with_conn(|conn| {
            let sql = paginated(SELECT_JOINED, Some("p.user_id = :user_id"));
            let mut stmt = conn.prepare_cached(&sql)?;
            let posts = stmt
                .query_map(
                    named_params! { ":user_id": user_id, ":limit": limit, ":offset": offset },
                    map_post,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(posts)
        })
    }

    pub fn get_by_category(&self, offset: u32, limit: u32, category_id: i64) -> Result<Vec<Post>> {
        self.db.with_conn(|conn| {
            let sql = paginated(SELECT_BY_CATEGORY, None);
            let mut stmt = conn.prepare_cached(&sql)?;
            let posts = stmt
                .query_map(
                    named_params! {
                        ":category_id": category_id,
                        ":limit": limit,
                        ":offset": offset
                    },
                    map_post,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(posts)
        })
    }

    /// File an existing post under another category. Repeats are ignored.
    pub fn add_category(&self, post_id: i64, category_id: i64) -> Result<()> {
        self.db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
                params![post_id, category_id],
            )?;
            Ok(())
        })
    }

    /// Hard delete. Comments, reactions and category links cascade.
    /// Deleting a missing id is not an error.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .db
            .with_conn_mut(|conn| Ok(conn.execute("DELETE FROM post WHERE id = ?1", [id])?))?;

        debug!(post_id = id, affected, "Post deleted");
        Ok(())
    }

    pub fn increment_reaction(&self, id: i64, reaction: Reaction) -> Result<()> {
        self.db.with_conn_mut(|conn| reaction_counter(conn, id, reaction, 1))
    }

    /// Never takes a counter below zero.
    pub fn decrement_reaction(&self, id: i64, reaction: Reaction) -> Result<()> {
        self.db.with_conn_mut(|conn| reaction_counter(conn, id, reaction, -1))
    }

    pub fn increment_comment_count(&self, id: i64) -> Result<()> {
        self.db.with_conn_mut(|conn| adjust_counter(conn, id, COMMENT_COUNT, 1))
    }
}
