//! Creates the bootstrap administrator account when none exists.
//!
//! Reads SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD from the environment and
//! is safe to run repeatedly.

use chrono::Utc;
use std::env;

use motorlot_backend::{
    config::Config,
    db::connection::create_pool,
    models::user::UserRole,
    repositories::user as user_repo,
    utils::password::hash_password,
    validation::rules::validate_password_strength,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let email = env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@motorlot.local".into());
    let password = env::var("SEED_ADMIN_PASSWORD")
        .map_err(|_| anyhow::anyhow!("SEED_ADMIN_PASSWORD must be set"))?;
    validate_password_strength(&password)
        .map_err(|_| anyhow::anyhow!("SEED_ADMIN_PASSWORD is too weak"))?;

    let pool = create_pool(&config.database_url).await?;

    if user_repo::find_user_by_email(&pool, &email).await?.is_some() {
        tracing::info!(%email, "Admin account already exists, nothing to do");
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    let user = user_repo::insert_user(
        &pool,
        &email,
        "admin",
        "Site",
        "Admin",
        &password_hash,
        UserRole::Admin,
        Utc::now(),
    )
    .await?;

    tracing::info!(user_id = %user.id, %email, "Seeded administrator account");
    Ok(())
}
