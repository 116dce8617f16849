//! Database abstraction layer
//!
//! This module provides a database abstraction over SQLite with connection
//! pooling, migrations, and transaction support.

use async_trait::async_trait;
use sqlx::{
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
    Error as SqlxError, Sqlite, SqlitePool, Transaction,
};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DatabaseError {
    /// Whether the error is a UNIQUE or PRIMARY KEY constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(SqlxError::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    /// Whether the error is a FOREIGN KEY constraint violation
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(SqlxError::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Enable WAL mode
    pub wal_mode: bool,
    /// Synchronous mode
    pub synchronous: SynchronousMode,
}

/// SQLite synchronous mode
#[derive(Debug, Clone, Copy)]
pub enum SynchronousMode {
    /// Off - no synchronization
    Off,
    /// Normal - synchronize at critical moments
    Normal,
    /// Full - synchronize after each write
    Full,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "warbler.db".to_string(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
            wal_mode: true,
            synchronous: SynchronousMode::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable WAL mode
    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// Set synchronous mode
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }
}

/// Database abstraction trait
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a raw SQL statement
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Begin a transaction
    async fn begin(&self) -> Result<DatabaseTransaction>;

    /// Close the database connection
    async fn close(&self) -> Result<()>;

    /// Check if the database is healthy
    async fn health_check(&self) -> Result<()>;
}

/// SQLite database implementation
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite database with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path))
            .map_err(|e| DatabaseError::Config(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        if config.wal_mode {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        options = match config.synchronous {
            SynchronousMode::Off => options.synchronous(SqliteSynchronous::Off),
            SynchronousMode::Normal => options.synchronous(SqliteSynchronous::Normal),
            SynchronousMode::Full => options.synchronous(SqliteSynchronous::Full),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %config.path, "Opened SQLite database");

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing)
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Config(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run migrations
    pub async fn migrate(&self, migrations: &[MigrationDefinition]) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                checksum TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current_version = self.current_version().await?;

        for migration in migrations {
            if migration.version <= current_version {
                let recorded: Option<String> =
                    sqlx::query_scalar("SELECT checksum FROM _migrations WHERE version = ?")
                        .bind(migration.version)
                        .fetch_optional(&self.pool)
                        .await?;

                if let Some(checksum) = recorded {
                    if checksum != migration.checksum {
                        return Err(DatabaseError::Migration(format!(
                            "checksum mismatch for applied migration {} ({})",
                            migration.version, migration.description
                        )));
                    }
                }
                continue;
            }

            tracing::info!(
                "Applying migration {} - {}",
                migration.version,
                migration.description
            );

            let mut tx = self.pool.begin().await?;

            sqlx::raw_sql(&migration.sql).execute(&mut *tx).await?;

            sqlx::query("INSERT INTO _migrations (version, description, checksum) VALUES (?, ?, ?)")
                .bind(migration.version)
                .bind(&migration.description)
                .bind(&migration.checksum)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            tracing::info!("Migration {} applied successfully", migration.version);
        }

        Ok(())
    }

    /// Get current migration version
    pub async fn current_version(&self) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(version.unwrap_or(0))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn begin(&self) -> Result<DatabaseTransaction> {
        let tx = self.pool.begin().await?;
        Ok(DatabaseTransaction { tx: Some(tx) })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// Database transaction wrapper
///
/// Dropping an uncommitted transaction rolls it back.
pub struct DatabaseTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl DatabaseTransaction {
    /// Borrow the transaction's connection for bound queries
    pub fn conn(&mut self) -> Result<&mut SqliteConnection> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| DatabaseError::Transaction("Transaction already finished".to_string()))?;

        Ok(&mut **tx)
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DatabaseError::Transaction("Transaction already finished".to_string()))?;

        tx.commit().await?;
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DatabaseError::Transaction("Transaction already finished".to_string()))?;

        tx.rollback().await?;
        Ok(())
    }
}

/// Migration definition
#[derive(Debug, Clone)]
pub struct MigrationDefinition {
    /// Migration version number
    pub version: i64,
    /// Migration description
    pub description: String,
    /// SQL to execute
    pub sql: String,
    /// Checksum for verification
    pub checksum: String,
}

impl MigrationDefinition {
    /// Create a new migration definition
    pub fn new(version: i64, description: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = format!("{:x}", md5::compute(&sql));

        Self {
            version,
            description: description.into(),
            sql,
            checksum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_database_creation() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_query() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();

        let affected = db
            .execute("INSERT INTO test (name) VALUES ('test')")
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_transaction_commit() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        sqlx::query("INSERT INTO test (name) VALUES (?)")
            .bind("alice")
            .execute(tx.conn().unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_transaction_rollback() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        sqlx::query("INSERT INTO test (name) VALUES ('alice')")
            .execute(tx.conn().unwrap())
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_transaction_dropped_rolls_back() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query("INSERT INTO test (name) VALUES ('alice')")
                .execute(tx.conn().unwrap())
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unique_violation_detected() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE test (name TEXT PRIMARY KEY)")
            .await
            .unwrap();
        db.execute("INSERT INTO test (name) VALUES ('alice')")
            .await
            .unwrap();

        let err = db
            .execute("INSERT INTO test (name) VALUES ('alice')")
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.execute("CREATE TABLE parent (name TEXT PRIMARY KEY)")
            .await
            .unwrap();
        db.execute("CREATE TABLE child (id INTEGER PRIMARY KEY, parent TEXT NOT NULL REFERENCES parent(name))")
            .await
            .unwrap();

        let err = db
            .execute("INSERT INTO child (parent) VALUES ('ghost')")
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_migrations() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        let migrations = vec![
            MigrationDefinition::new(
                1,
                "Initial schema",
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            ),
            MigrationDefinition::new(
                2,
                "Add email column",
                "ALTER TABLE users ADD COLUMN email TEXT",
            ),
        ];

        db.migrate(&migrations).await.unwrap();

        let version = db.current_version().await.unwrap();
        assert_eq!(version, 2);

        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='users'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let table_name: String = row.get("name");
        assert_eq!(table_name, "users");
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        let migrations = vec![MigrationDefinition::new(
            1,
            "Initial schema",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
        )];

        db.migrate(&migrations).await.unwrap();
        let version1 = db.current_version().await.unwrap();

        db.migrate(&migrations).await.unwrap();
        let version2 = db.current_version().await.unwrap();

        assert_eq!(version1, version2);
        assert_eq!(version2, 1);
    }

    #[tokio::test]
    async fn test_migration_checksum_mismatch() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.migrate(&[MigrationDefinition::new(
            1,
            "Initial schema",
            "CREATE TABLE users (id INTEGER PRIMARY KEY)",
        )])
        .await
        .unwrap();

        let result = db
            .migrate(&[MigrationDefinition::new(
                1,
                "Initial schema",
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            )])
            .await;
        assert!(matches!(result, Err(DatabaseError::Migration(_))));
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warbler.db");
        let config = DatabaseConfig::new(path.to_string_lossy().to_string()).max_connections(2);

        let db = SqliteDatabase::new(config).await.unwrap();
        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        db.close().await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DatabaseConfig::new("test.db")
            .max_connections(5)
            .connect_timeout(Duration::from_secs(10))
            .wal_mode(true)
            .synchronous(SynchronousMode::Full);

        assert_eq!(config.path, "test.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.wal_mode);
        assert!(matches!(config.synchronous, SynchronousMode::Full));
    }
}
