use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::info;

use crate::database::Database;
use crate::error::{CoreError, Result};

/// A single forward-only schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> i64;

    async fn up(&self, conn: &mut SqliteConnection) -> std::result::Result<(), sqlx::Error>;
}

/// Migration to create the accounts table
struct CreateUsersTable;

#[async_trait]
impl Migration for CreateUsersTable {
    fn name(&self) -> &str {
        "create_users_table"
    }

    fn version(&self) -> i64 {
        20250101_000001
    }

    async fn up(&self, conn: &mut SqliteConnection) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                unit TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

/// Migration to create the work request table
struct CreateRequestTable;

#[async_trait]
impl Migration for CreateRequestTable {
    fn name(&self) -> &str {
        "create_request_table"
    }

    fn version(&self) -> i64 {
        20250101_000002
    }

    async fn up(&self, conn: &mut SqliteConnection) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS request (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                jenis_request TEXT NOT NULL,
                unit TEXT NOT NULL,
                nama_barang TEXT,
                type_model TEXT,
                jumlah INTEGER,
                lokasi TEXT,
                jenis_pekerjaan TEXT,
                kegunaan TEXT,
                line_items TEXT NOT NULL DEFAULT '{}',
                tgl_request TEXT NOT NULL,
                tgl_peminjaman TEXT,
                tgl_pengembalian TEXT,
                keterangan TEXT,
                status_request TEXT NOT NULL DEFAULT 'DIAJUKAN',
                requested_by TEXT NOT NULL,
                approved_by TEXT,
                accepted_by TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_request_status ON request (status_request)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Applies pending migrations in version order, recording each in `schema_migrations`.
pub struct MigrationRunner {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn add_migration(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Run every migration not yet recorded. Returns how many were applied.
    pub async fn run_pending(&mut self, db: &Database) -> Result<usize> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(db.pool())
        .await?;

        self.migrations.sort_by_key(|m| m.version());

        let mut applied = 0;
        for migration in &self.migrations {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
                    .bind(migration.version())
                    .fetch_optional(db.pool())
                    .await?;
            if exists.is_some() {
                continue;
            }

            let wrap = |source| CoreError::Migration {
                version: migration.version(),
                name: migration.name().to_string(),
                source,
            };

            let mut tx = db.pool().begin().await?;
            migration.up(&mut tx).await.map_err(wrap)?;
            sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
                .bind(migration.version())
                .bind(migration.name())
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            tx.commit().await?;

            info!(version = migration.version(), name = migration.name(), "Applied migration");
            applied += 1;
        }

        Ok(applied)
    }
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring the schema up to date. Returns the number of migrations applied.
pub async fn run_migrations(db: &Database) -> Result<usize> {
    let mut runner = MigrationRunner::new();

    runner.add_migration(Box::new(CreateUsersTable));
    runner.add_migration(Box::new(CreateRequestTable));

    runner.run_pending(db).await
}
