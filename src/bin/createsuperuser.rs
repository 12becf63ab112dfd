//! Create an administrator account, or promote an existing user to one.

use std::io;

use blogicum::{
    db::{DBClient, UserExt},
    models::UserRole,
    utils::password,
};
use clap::Parser;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

/// `createsuperuser` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "createsuperuser",
    about = "Create or promote a Blogicum administrator",
    version
)]
struct CliArgs {
    /// Account name; an existing account is promoted.
    #[arg(long, value_name = "name")]
    username: String,
    /// Email of a new account.
    #[arg(long, value_name = "address", default_value = "")]
    email: String,
    /// Password of a new account. Required unless the user exists.
    #[arg(long, value_name = "password")]
    password: Option<String>,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = match args.database_url.clone() {
        Some(url) => url,
        None => std::env::var("DATABASE_URL")
            .map_err(|_| io::Error::other("DATABASE_URL must be set or passed with --database-url"))?,
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .map_err(|e| io::Error::other(format!("connect to database: {e}")))?;
    let db_client = DBClient::new(pool);

    let existing = db_client
        .get_user(None, Some(&args.username), None, None)
        .await
        .map_err(|e| io::Error::other(format!("look up user: {e}")))?;

    if existing.is_none() {
        let raw = args
            .password
            .as_deref()
            .ok_or_else(|| io::Error::other("--password is required for a new user"))?;
        let hashed = password::hash(raw).map_err(|e| io::Error::other(e.to_string()))?;
        db_client
            .save_user(&args.username, &args.email, &hashed)
            .await
            .map_err(|e| io::Error::other(format!("create user: {e}")))?;
        tracing::info!(username = %args.username, "User created");
    }

    let user = db_client
        .update_user_role(&args.username, UserRole::Admin)
        .await
        .map_err(|e| io::Error::other(format!("promote user: {e}")))?;

    tracing::info!(username = %user.username, role = user.role.to_str(), "Superuser ready");
    Ok(())
}
