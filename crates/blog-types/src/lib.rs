pub mod models;

pub use models::{Category, Comment, NewPost, NewUser, Post, Reaction, User, UserReaction};
