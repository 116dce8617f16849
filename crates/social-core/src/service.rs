//! Request-layer facade
//!
//! [`SocialService`] is the boundary a request handler talks to. Each
//! identity-scoped method runs [`AuthGate::resolve`] first and passes the
//! resolved user on as the acting identity; registration and login are the
//! only methods reachable without a token.

use storage::{DatabaseConfig, SqliteDatabase};

use crate::auth::AuthGate;
use crate::error::{Result, SocialError};
use crate::feeds::{FeedAggregator, RenderedPost};
use crate::graph::SocialGraph;
use crate::identity::IdentityStore;
use crate::posts::{Post, PostStore};
use crate::profiles::{ProfileService, UserSummary};
use crate::schema;

/// Social network operations over one store handle
///
/// # Example
///
/// ```rust,no_run
/// use social_core::SocialService;
/// use storage::DatabaseConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = SocialService::connect(DatabaseConfig::new("warbler.db")).await?;
///
///     service.register("alice", "pw1").await?;
///     let token = service.login("alice", "pw1").await?;
///     service.post(Some(token.as_str()), "hello").await?;
///
///     for post in service.feed(Some(token.as_str())).await? {
///         println!("{} {}: {}", post.time, post.author, post.content);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SocialService {
    db: SqliteDatabase,
    identity: IdentityStore,
    graph: SocialGraph,
    posts: PostStore,
    auth: AuthGate,
    feeds: FeedAggregator,
    profiles: ProfileService,
}

impl SocialService {
    /// Build the service over an already migrated database
    pub fn new(db: SqliteDatabase) -> Self {
        let identity = IdentityStore::new(db.clone());
        let graph = SocialGraph::new(db.clone());
        let posts = PostStore::new(db.clone());

        Self {
            auth: AuthGate::new(identity.clone()),
            feeds: FeedAggregator::new(graph.clone(), posts.clone()),
            profiles: ProfileService::new(graph.clone(), posts.clone()),
            db,
            identity,
            graph,
            posts,
        }
    }

    /// Open the database described by `config`, migrate it, and build the service
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let db = SqliteDatabase::new(config).await?;
        schema::migrate(&db).await?;
        Ok(Self::new(db))
    }

    /// Build the service over a fresh in-memory database
    pub async fn in_memory() -> Result<Self> {
        let db = SqliteDatabase::in_memory().await?;
        schema::migrate(&db).await?;
        Ok(Self::new(db))
    }

    /// The underlying store handle
    pub fn database(&self) -> &SqliteDatabase {
        &self.db
    }

    /// The identity store
    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// The social graph
    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    /// The post store
    pub fn posts(&self) -> &PostStore {
        &self.posts
    }

    /// Register a new account
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        self.identity.register(username, password).await?;
        Ok(())
    }

    /// Check credentials and issue a token
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(SocialError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let user = self.identity.verify_credentials(username, password).await?;
        tracing::info!(username, "Issued token");
        Ok(self.auth.issue(&user))
    }

    /// Publish a post as the token's user
    pub async fn post(&self, token: Option<&str>, content: &str) -> Result<Post> {
        let user = self.auth.resolve(token).await?;
        self.posts.create_post(&user, content).await
    }

    /// The token user's feed, newest first
    pub async fn feed(&self, token: Option<&str>) -> Result<Vec<RenderedPost>> {
        let user = self.auth.resolve(token).await?;
        self.feeds.build_feed(&user).await
    }

    /// Every other user with their counts, ordered by username
    pub async fn list_users(&self, token: Option<&str>) -> Result<Vec<UserSummary>> {
        let user = self.auth.resolve(token).await?;
        let others = self.graph.list_other_users(&user.username).await?;
        self.profiles.summarize_all(&others).await
    }

    /// Follow `target` as the token's user
    pub async fn follow(&self, token: Option<&str>, target: &str) -> Result<()> {
        let user = self.auth.resolve(token).await?;
        if target.is_empty() {
            return Err(SocialError::InvalidInput("username is required".to_string()));
        }
        self.graph.follow(&user.username, target).await
    }

    /// The token user's own summary
    pub async fn profile(&self, token: Option<&str>) -> Result<UserSummary> {
        let user = self.auth.resolve(token).await?;
        self.profiles.summarize(&user).await
    }

    /// Users the token's user follows
    pub async fn following(&self, token: Option<&str>) -> Result<Vec<UserSummary>> {
        let user = self.auth.resolve(token).await?;
        let users = self.graph.list_following(&user.username).await?;
        self.profiles.summarize_all(&users).await
    }

    /// Users following the token's user
    pub async fn followers(&self, token: Option<&str>) -> Result<Vec<UserSummary>> {
        let user = self.auth.resolve(token).await?;
        let users = self.graph.list_followers(&user.username).await?;
        self.profiles.summarize_all(&users).await
    }
}
