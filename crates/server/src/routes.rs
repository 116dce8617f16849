//! HTTP routes
//!
//! Thin handlers: each one pulls the token and body out of the request,
//! calls the matching [`SocialService`] method, and renders the result as
//! JSON. Tokens travel in an `Authorization: Bearer` header or, failing
//! that, a `token` query parameter.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use social_core::{auth::bearer_token, RenderedPost, SocialService, UserSummary};
use std::convert::Infallible;
use std::sync::Arc;
use storage::Database;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The social service every handler drives
    pub service: SocialService,
}

/// Build the application router
pub fn router(service: SocialService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/post", post(create_post))
        .route("/feed", get(feed))
        .route("/users", get(list_users))
        .route("/follow", post(follow))
        .route("/profile", get(profile))
        .route("/following", get(following))
        .route("/followers", get(followers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bearer token carried by a request, if any
#[derive(Debug, Clone, Default)]
pub struct AuthToken(pub Option<String>);

impl AuthToken {
    /// Borrow the token
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        // Form decoding turns an unescaped '+' into a space; Base64 never
        // contains spaces, so restore them.
        let token = from_header.or_else(|| {
            Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .map(|t| t.replace(' ', "+"))
        });

        Ok(AuthToken(token))
    }
}

/// JSON request body whose rejections use the API error envelope
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// Username and password body
///
/// Absent and `null` fields read as empty, which registration and login
/// reject as invalid input.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    /// Username
    #[serde(default)]
    pub username: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

/// New post body
#[derive(Debug, Default, Deserialize)]
pub struct NewPost {
    /// Post text
    #[serde(default)]
    pub content: Option<String>,
}

/// Follow request body
#[derive(Debug, Default, Deserialize)]
pub struct FollowRequest {
    /// Username to follow
    #[serde(default)]
    pub username: Option<String>,
}

/// Acknowledgement body
#[derive(Debug, Serialize)]
pub struct Status {
    /// Outcome, `created` or `accepted`
    pub status: &'static str,
    /// Id of the created post, for post submissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Status {
    fn created() -> Self {
        Self { status: "created", id: None }
    }

    fn accepted() -> Self {
        Self { status: "accepted", id: None }
    }
}

/// Login response body
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Bearer token for later requests
    pub token: String,
}

async fn index() -> &'static str {
    "Warbler"
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.service.database().health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Credentials>,
) -> ApiResult<(StatusCode, Json<Status>)> {
    state.service.register(body.username(), body.password()).await?;
    Ok((StatusCode::CREATED, Json(Status::created())))
}

async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<Credentials>,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.service.login(body.username(), body.password()).await?;
    Ok(Json(TokenResponse { token }))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
    JsonBody(body): JsonBody<NewPost>,
) -> ApiResult<(StatusCode, Json<Status>)> {
    let content = body.content.unwrap_or_default();
    let post = state.service.post(token.as_deref(), &content).await?;
    Ok((
        StatusCode::CREATED,
        Json(Status {
            id: Some(post.id),
            ..Status::accepted()
        }),
    ))
}

async fn feed(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
) -> ApiResult<Json<Vec<RenderedPost>>> {
    Ok(Json(state.service.feed(token.as_deref()).await?))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.service.list_users(token.as_deref()).await?))
}

async fn follow(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
    JsonBody(body): JsonBody<FollowRequest>,
) -> ApiResult<Json<Status>> {
    let target = body.username.unwrap_or_default();
    state.service.follow(token.as_deref(), &target).await?;
    Ok(Json(Status::accepted()))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
) -> ApiResult<Json<UserSummary>> {
    Ok(Json(state.service.profile(token.as_deref()).await?))
}

async fn following(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.service.following(token.as_deref()).await?))
}

async fn followers(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.service.followers(token.as_deref()).await?))
}
