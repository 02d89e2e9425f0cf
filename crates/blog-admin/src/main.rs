mod config;

use tracing::{info, warn};

use blog_db::Database;
use config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogdb=info,blog_db=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Opening applies the schema and seeds
    let db = Database::open(&config.db_path, &config.db_options())?;

    if config.reset {
        warn!("Resetting database at {}", config.db_path.display());
        db.reset()?;
    }

    let counts = db.counts()?;
    info!(
        users = counts.users,
        categories = counts.categories,
        posts = counts.posts,
        comments = counts.comments,
        reactions = counts.reactions,
        "Database ready"
    );

    Ok(())
}
