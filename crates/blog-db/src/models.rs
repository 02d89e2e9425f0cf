use std::time::Duration;

/// Connection settings for [`crate::Database::open`].
#[derive(Debug, Clone)]
pub struct DbOptions {
    /// Number of read-only connections. Clamped to at least one.
    pub readers: usize,
    pub busy_timeout: Duration,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            readers: 4,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Row counts per table, for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub users: i64,
    pub categories: i64,
    pub posts: i64,
    pub comments: i64,
    pub reactions: i64,
}
