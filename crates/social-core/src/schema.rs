//! Relational schema for users, follow edges, and posts

use storage::{MigrationDefinition, SqliteDatabase};

/// Schema migrations in application order
pub fn migrations() -> Vec<MigrationDefinition> {
    vec![
        MigrationDefinition::new(
            1,
            "Create users",
            "CREATE TABLE users (
                username TEXT PRIMARY KEY NOT NULL,
                password TEXT NOT NULL
            )",
        ),
        MigrationDefinition::new(
            2,
            "Create follow edges",
            "CREATE TABLE follow_edges (
                follower TEXT NOT NULL REFERENCES users(username),
                followed TEXT NOT NULL REFERENCES users(username),
                PRIMARY KEY (follower, followed)
            );
            CREATE INDEX idx_follow_edges_followed ON follow_edges(followed);",
        ),
        MigrationDefinition::new(
            3,
            "Create posts",
            "CREATE TABLE posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author TEXT NOT NULL REFERENCES users(username),
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX idx_posts_author ON posts(author);",
        ),
    ]
}

/// Bring the database up to the current schema
pub async fn migrate(db: &SqliteDatabase) -> storage::Result<()> {
    db.migrate(&migrations()).await
}

/// Migrated in-memory database for unit tests
#[cfg(test)]
pub(crate) async fn test_database() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory().await.unwrap();
    migrate(&db).await.unwrap();
    db
}
