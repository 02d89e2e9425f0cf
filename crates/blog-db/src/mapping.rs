//! Row-to-model conversion shared by the read paths.
//!
//! Column order for posts is fixed: the ten post columns (category id last),
//! optionally followed by author username, email, photo and category name,
//! code, description.

use blog_types::{Category, Comment, Post, Reaction, User, UserReaction};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use tracing::warn;

/// Date, time with optional fraction, and UTC offset.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Unparseable timestamps become the Unix epoch instead of failing the read.
fn timestamp_or_epoch(table: &'static str, id: i64, raw: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!(table, id, raw, "Unparseable timestamp, using epoch");
        DateTime::<Utc>::default()
    })
}

/// Post columns only; `user` stays `None` and the category carries its id.
pub(crate) fn map_post_bare(row: &Row<'_>) -> rusqlite::Result<Post> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(4)?;

    Ok(Post {
        id,
        user_id: row.get(1)?,
        title: row.get(2)?,
        text: row.get(3)?,
        created_at: timestamp_or_epoch("post", id, &created_at),
        like_count: row.get(5)?,
        dislike_count: row.get(6)?,
        comment_count: row.get(7)?,
        photo_id: row.get(8)?,
        user: None,
        category: Category {
            id: row.get(9)?,
            ..Default::default()
        },
    })
}

/// Post joined with its author and category.
pub(crate) fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let mut post = map_post_bare(row)?;

    // LEFT JOINs: a dangling reference reads back as empty fields.
    post.user = Some(User {
        id: post.user_id.clone(),
        username: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
        photo_id: row.get(12)?,
        ..Default::default()
    });
    post.category.name = row.get::<_, Option<String>>(13)?.unwrap_or_default();
    post.category.name_code = row.get::<_, Option<String>>(14)?.unwrap_or_default();
    post.category.description = row.get::<_, Option<String>>(15)?.unwrap_or_default();

    Ok(post)
}

/// `id, name, name_code, description`
pub(crate) fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        name_code: row.get(2)?,
        description: row.get(3)?,
    })
}

/// `id, post_id, user_id, comment_dt, comment`
pub(crate) fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(3)?;

    Ok(Comment {
        id,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: timestamp_or_epoch("comment", id, &created_at),
        text: row.get(4)?,
    })
}

/// `post_id, user_id, reaction`
pub(crate) fn map_user_reaction(row: &Row<'_>) -> rusqlite::Result<UserReaction> {
    let code: i64 = row.get(2)?;
    let reaction = Reaction::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Integer,
            format!("unknown reaction code {}", code).into(),
        )
    })?;

    Ok(UserReaction {
        post_id: row.get(0)?,
        user_id: row.get(1)?,
        reaction,
    })
}
