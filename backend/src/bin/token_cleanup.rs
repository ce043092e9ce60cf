use chrono::Utc;

use motorlot_backend::{
    config::Config, db::connection::create_pool, repositories::password_reset as reset_repo,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let deleted = reset_repo::delete_spent_tokens(&pool, Utc::now()).await?;
    if deleted > 0 {
        tracing::info!("Deleted {} spent password reset tokens", deleted);
    }

    sqlx::query("VACUUM (ANALYZE) password_resets")
        .execute(&*pool)
        .await?;

    Ok(())
}
