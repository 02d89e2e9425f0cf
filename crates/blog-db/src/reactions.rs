use blog_types::{Reaction, UserReaction};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::mapping::map_user_reaction;
use crate::posts::{PostStore, reaction_counter};
use crate::{Result, StoreError};

fn insert_reaction(
    conn: &Connection,
    post_id: i64,
    user_id: &str,
    reaction: Reaction,
) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO user_reactions (post_id, user_id, reaction) VALUES (?1, ?2, ?3)",
        params![post_id, user_id, reaction.code()],
    )?;
    if inserted == 0 {
        return Err(StoreError::NotInserted);
    }
    Ok(())
}

/// Returns how many matching rows were deleted.
fn delete_reaction(
    conn: &Connection,
    post_id: i64,
    user_id: &str,
    reaction: Reaction,
) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM user_reactions WHERE post_id = ?1 AND user_id = ?2 AND reaction = ?3",
        params![post_id, user_id, reaction.code()],
    )?;
    Ok(removed)
}

fn current_reactions(conn: &Connection, post_id: i64, user_id: &str) -> Result<Vec<Reaction>> {
    let mut stmt = conn.prepare_cached(
        "SELECT post_id, user_id, reaction FROM user_reactions WHERE post_id = ?1 AND user_id = ?2",
    )?;
    let rows = stmt
        .query_map(params![post_id, user_id], map_user_reaction)?
        .map(|row| row.map(|r| r.reaction))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl PostStore<'_> {
    /// Whether `user_id` holds `reaction` on the post. Read-only.
    pub fn has_reacted(&self, post_id: i64, user_id: &str, reaction: Reaction) -> Result<bool> {
        self.db.with_conn(|conn| {
            let exists = conn
                .prepare_cached(
                    "SELECT EXISTS(
                        SELECT 1 FROM user_reactions
                        WHERE post_id = ?1 AND user_id = ?2 AND reaction = ?3
                     )",
                )?
                .query_row(params![post_id, user_id, reaction.code()], |row| row.get(0))?;
            Ok(exists)
        })
    }

    /// Delete the matching reaction row(s). Returns whether anything was removed.
    /// Counters are left alone; see [`PostStore::unreact`].
    pub fn remove_user_reaction(
        &self,
        post_id: i64,
        user_id: &str,
        reaction: Reaction,
    ) -> Result<bool> {
        let removed = self
            .db
            .with_conn_mut(|conn| delete_reaction(conn, post_id, user_id, reaction))?;

        debug!(post_id, user_id, ?reaction, removed, "User reaction removed");
        Ok(removed > 0)
    }

    /// Record a reaction row. Counters are left alone; see [`PostStore::react`].
    pub fn new_user_reaction(
        &self,
        post_id: i64,
        user_id: &str,
        reaction: Reaction,
    ) -> Result<()> {
        self.db.with_conn_mut(|conn| insert_reaction(conn, post_id, user_id, reaction))?;

        debug!(post_id, user_id, ?reaction, "User reaction recorded");
        Ok(())
    }

    /// Set the user's reaction on a post, replacing any previous one, and keep
    /// the post's counters in step. Runs as one transaction.
    ///
    /// Returns `false` when the user already held exactly this reaction.
    pub fn react(&self, post_id: i64, user_id: &str, reaction: Reaction) -> Result<bool> {
        let changed = self.db.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let existing = current_reactions(&tx, post_id, user_id)?;
            if existing == [reaction] {
                return Ok(false);
            }

            // Duplicate rows each count once; the first delete of a kind
            // takes all of them, later repeats remove nothing.
            for previous in existing {
                let removed = delete_reaction(&tx, post_id, user_id, previous)?;
                if removed > 0 {
                    reaction_counter(&tx, post_id, previous, -(removed as i64))?;
                }
            }
            reaction_counter(&tx, post_id, reaction, 1)?;
            insert_reaction(&tx, post_id, user_id, reaction)?;

            tx.commit()?;
            Ok(true)
        })?;

        debug!(post_id, user_id, ?reaction, changed, "Reaction set");
        Ok(changed)
    }

    /// Withdraw a reaction and decrement its counter once per removed row,
    /// in one transaction. Returns whether the user held that reaction.
    pub fn unreact(&self, post_id: i64, user_id: &str, reaction: Reaction) -> Result<bool> {
        let removed = self.db.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let removed = delete_reaction(&tx, post_id, user_id, reaction)?;
            if removed == 0 {
                return Ok(false);
            }
            reaction_counter(&tx, post_id, reaction, -(removed as i64))?;

            tx.commit()?;
            Ok(true)
        })?;

        debug!(post_id, user_id, ?reaction, removed, "Reaction withdrawn");
        Ok(removed)
    }

    pub fn reactions(&self, post_id: i64) -> Result<Vec<UserReaction>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT post_id, user_id, reaction FROM user_reactions WHERE post_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([post_id], map_user_reaction)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::testing::*;

    fn setup() -> (tempfile::TempDir, Database, i64) {
        let (dir, db) = open_temp();
        add_user(&db, "u1");
        add_user(&db, "u2");
        let cat = add_category(&db, "rust");
        let id = db.posts().create(&new_post("u1", cat, "Hello", at(9, 0))).unwrap();
        (dir, db, id)
    }

    #[test]
    fn recorded_reaction_is_removed_once() {
        let (_dir, db, id) = setup();
        let posts = db.posts();

        posts.new_user_reaction(id, "u1", Reaction::Like).unwrap();
        assert!(posts.remove_user_reaction(id, "u1", Reaction::Like).unwrap());

        assert!(!posts.has_reacted(id, "u1", Reaction::Like).unwrap());
        assert!(!posts.remove_user_reaction(id, "u1", Reaction::Like).unwrap());
        assert!(posts.reactions(id).unwrap().is_empty());
    }

    #[test]
    fn has_reacted_does_not_modify() {
        let (_dir, db, id) = setup();
        let posts = db.posts();
        posts.new_user_reaction(id, "u1", Reaction::Dislike).unwrap();

        assert!(posts.has_reacted(id, "u1", Reaction::Dislike).unwrap());
        assert!(posts.has_reacted(id, "u1", Reaction::Dislike).unwrap());
        assert!(!posts.has_reacted(id, "u1", Reaction::Like).unwrap());
        assert!(!posts.has_reacted(id, "u2", Reaction::Dislike).unwrap());
        assert_eq!(posts.reactions(id).unwrap().len(), 1);
    }

    #[test]
    fn reaction_on_missing_post_is_rejected() {
        let (_dir, db, _id) = setup();
        let result = db.posts().new_user_reaction(999, "u1", Reaction::Like);
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[test]
    fn reactions_list_in_insert_order() {
        let (_dir, db, id) = setup();
        let posts = db.posts();
        posts.new_user_reaction(id, "u2", Reaction::Dislike).unwrap();
        posts.new_user_reaction(id, "u1", Reaction::Like).unwrap();

        let rows = posts.reactions(id).unwrap();
        assert_eq!(
            rows,
            [
                UserReaction { post_id: id, user_id: "u2".into(), reaction: Reaction::Dislike },
                UserReaction { post_id: id, user_id: "u1".into(), reaction: Reaction::Like },
            ]
        );
    }

    #[test]
    fn react_switches_and_keeps_counters_in_step() {
        let (_dir, db, id) = setup();
        let posts = db.posts();

        assert!(posts.react(id, "u1", Reaction::Like).unwrap());
        assert!(posts.react(id, "u2", Reaction::Like).unwrap());
        assert!(!posts.react(id, "u1", Reaction::Like).unwrap());

        let post = posts.get_bare(id).unwrap();
        assert_eq!((post.like_count, post.dislike_count), (2, 0));

        assert!(posts.react(id, "u1", Reaction::Dislike).unwrap());
        let post = posts.get_bare(id).unwrap();
        assert_eq!((post.like_count, post.dislike_count), (1, 1));
        assert!(posts.has_reacted(id, "u1", Reaction::Dislike).unwrap());
        assert!(!posts.has_reacted(id, "u1", Reaction::Like).unwrap());
    }

    #[test]
    fn react_on_missing_post_leaves_nothing_behind() {
        let (_dir, db, _id) = setup();
        let posts = db.posts();

        assert!(matches!(posts.react(999, "u1", Reaction::Like), Err(StoreError::NotFound)));
        assert!(posts.reactions(999).unwrap().is_empty());
    }

    #[test]
    fn unreact_decrements_only_when_held() {
        let (_dir, db, id) = setup();
        let posts = db.posts();
        posts.react(id, "u1", Reaction::Like).unwrap();

        assert!(!posts.unreact(id, "u2", Reaction::Like).unwrap());
        assert_eq!(posts.get_bare(id).unwrap().like_count, 1);

        assert!(posts.unreact(id, "u1", Reaction::Like).unwrap());
        assert_eq!(posts.get_bare(id).unwrap().like_count, 0);
        assert!(posts.reactions(id).unwrap().is_empty());
    }

    #[test]
    fn unreact_drops_one_count_per_duplicate_row() {
        let (_dir, db, id) = setup();
        let posts = db.posts();
        for _ in 0..2 {
            posts.new_user_reaction(id, "u1", Reaction::Like).unwrap();
            posts.increment_reaction(id, Reaction::Like).unwrap();
        }
        posts.react(id, "u2", Reaction::Like).unwrap();

        assert!(posts.unreact(id, "u1", Reaction::Like).unwrap());

        assert_eq!(posts.get_bare(id).unwrap().like_count, 1);
        assert!(!posts.has_reacted(id, "u1", Reaction::Like).unwrap());
        assert_eq!(posts.reactions(id).unwrap().len(), 1);
    }

    #[test]
    fn react_replaces_duplicate_rows_with_one() {
        let (_dir, db, id) = setup();
        let posts = db.posts();
        for _ in 0..2 {
            posts.new_user_reaction(id, "u1", Reaction::Like).unwrap();
            posts.increment_reaction(id, Reaction::Like).unwrap();
        }

        assert!(posts.react(id, "u1", Reaction::Dislike).unwrap());

        let post = posts.get_bare(id).unwrap();
        assert_eq!((post.like_count, post.dislike_count), (0, 1));
        assert_eq!(
            posts.reactions(id).unwrap(),
            [UserReaction { post_id: id, user_id: "u1".into(), reaction: Reaction::Dislike }]
        );
    }
}
