use blog_types::Comment;
use chrono::Utc;
use rusqlite::params;
use tracing::debug;

use crate::mapping::{format_timestamp, map_comment};
use crate::posts::{COMMENT_COUNT, adjust_counter};
use crate::{Database, Result};

impl Database {
    /// Add a comment and bump the post's comment counter in one transaction.
    /// A missing post is `NotFound` and nothing is written.
    pub fn new_comment(&self, post_id: i64, user_id: &str, text: &str) -> Result<i64> {
        let created_at = format_timestamp(&Utc::now());

        let id = self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            adjust_counter(&tx, post_id, COMMENT_COUNT, 1)?;
            tx.execute(
                "INSERT INTO comment (post_id, user_id, comment_dt, comment) VALUES (?1, ?2, ?3, ?4)",
                params![post_id, user_id, created_at, text],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;
            Ok(id)
        })?;

        debug!(comment_id = id, post_id, user_id, "Comment created");
        Ok(id)
    }

    /// Oldest first.
    pub fn get_post_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, post_id, user_id, comment_dt, comment
                 FROM comment
                 WHERE post_id = ?1
                 ORDER BY comment_dt, id",
            )?;
            let comments = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(comments)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreError;
    use crate::testing::*;

    #[test]
    fn comments_bump_counter_and_list_in_order() {
        let (_dir, db) = open_temp();
        add_user(&db, "u1");
        add_user(&db, "u2");
        let cat = add_category(&db, "rust");
        let id = db.posts().create(&new_post("u1", cat, "Hello", at(9, 0))).unwrap();

        let first = db.new_comment(id, "u2", "nice").unwrap();
        let second = db.new_comment(id, "u1", "thanks").unwrap();

        let comments = db.get_post_comments(id).unwrap();
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), [first, second]);
        assert_eq!(comments[0].text, "nice");
        assert_eq!(comments[0].user_id, "u2");
        assert_eq!(db.posts().get(id).unwrap().comment_count, 2);
    }

    #[test]
    fn comment_on_missing_post_writes_nothing() {
        let (_dir, db) = open_temp();
        add_user(&db, "u1");

        assert!(matches!(db.new_comment(5, "u1", "hi"), Err(StoreError::NotFound)));
        assert_eq!(db.counts().unwrap().comments, 0);
    }

    #[test]
    fn comment_by_unknown_user_rolls_back_counter() {
        let (_dir, db) = open_temp();
        add_user(&db, "u1");
        let cat = add_category(&db, "rust");
        let id = db.posts().create(&new_post("u1", cat, "Hello", at(9, 0))).unwrap();

        assert!(matches!(db.new_comment(id, "ghost", "hi"), Err(StoreError::Database(_))));
        assert_eq!(db.posts().get_bare(id).unwrap().comment_count, 0);
    }
}
