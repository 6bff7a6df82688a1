pub mod config;
pub mod database;
pub mod error;
pub mod migrations;

pub use config::{
    AppConfig, AuthConfig, DatabaseConfig, PolicyConfig, RequestDeletePolicy, SeedConfig,
    SeedOperator, ServerConfig,
};
pub use database::Database;
pub use error::{CoreError, Result};
pub use migrations::{run_migrations, Migration, MigrationRunner};

/// Opens an in-memory database with the full schema applied.
pub async fn test_database() -> Result<Database> {
    let db = Database::connect_in_memory().await?;
    run_migrations(&db).await?;
    Ok(db)
}
