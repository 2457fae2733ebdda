use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use worship_db::{create_pool, schema::initialize_database};

/// Creates or upgrades the schema, then exits.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;

    info!("Connecting to database...");
    let db_pool = create_pool(&database_url).await?;

    info!("Initializing database schema...");
    initialize_database(&db_pool).await?;
    info!("Database schema is up to date");

    Ok(())
}
