use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Opaque hash, never sent over the wire.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role_id: i64,
    pub permission_id: i64,
    pub photo_id: Option<i64>,
}

/// Input for registering a user. Role and permission default to the
/// seeded `user` entries when `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i64>,
    pub permission_id: Option<i64>,
    pub photo_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub name_code: String,
    pub description: String,
}

/// A post as read back from storage.
///
/// `user` is populated only by the joined read paths; `category` always
/// carries at least the id, with name fields filled in when joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
    pub photo_id: Option<i64>,
    pub user: Option<User>,
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub user_id: String,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub photo_id: Option<i64>,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
}

/// A user's vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    /// Small-integer code used in persisted rows.
    pub fn code(self) -> i64 {
        match self {
            Reaction::Like => 0,
            Reaction::Dislike => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Reaction::Like),
            1 => Some(Reaction::Dislike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReaction {
    pub post_id: i64,
    pub user_id: String,
    pub reaction: Reaction,
}
