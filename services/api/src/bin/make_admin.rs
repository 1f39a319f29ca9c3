//! Promote an existing user to admin

use anyhow::Result;
use clap::Parser;
use common::database::{DatabaseConfig, init_pool};
use disc_api::repositories::{PgUserRepository, UserRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "make-admin", about = "Grant admin privileges to a user")]
struct Cli {
    /// Username of the account to promote
    username: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    let users = PgUserRepository::new(pool);

    let Some(user) = users.find_by_username(&cli.username).await? else {
        anyhow::bail!("User '{}' not found", cli.username);
    };

    if user.is_admin {
        info!("User '{}' is already an admin", user.username);
        return Ok(());
    }

    users.set_admin(user.id, true).await?;
    info!("User '{}' (ID: {}) is now an admin", user.username, user.id);

    Ok(())
}
