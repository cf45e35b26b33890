use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Category, Page, PostView};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{parse_id, ApiJson, CurrentUser, ListQuery, MaybeUser};
use crate::metrics::WriteOp;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFeed {
    pub posts: Vec<PostView>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl From<Page<PostView>> for PostFeed {
    fn from(page: Page<PostView>) -> Self {
        Self {
            posts: page.items,
            current_page: page.current_page,
            total_pages: page.total_pages,
            total: page.total,
        }
    }
}

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    query: ListQuery,
) -> ApiResult<Json<PostFeed>> {
    let filter = Category::filter_from_query(query.category.as_deref());
    let page = state
        .services
        .posts
        .list_posts(filter, query.page, caller.as_ref())
        .await?;
    Ok(Json(page.into()))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let post_id = parse_id(&id, "Post")?;
    let post = state.services.posts.get_post(post_id, caller.as_ref()).await?;
    Ok(Json(json!({ "post": post })))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreatePostBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let posts = &state.services.posts;
    let post = posts
        .create_post(&user, body.content.as_deref().unwrap_or_default(), body.category.as_deref())
        .await?;
    // a fresh post carries no reaction from anyone
    let view = posts.describe(post, None).await?;

    state.metrics.record(WriteOp::CreatePost);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully", "post": view })),
    ))
}

/// POST /posts/{id}/repost
pub async fn repost(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let post_id = parse_id(&id, "Post")?;
    let posts = &state.services.posts;
    let repost = posts.repost(&user, post_id).await?;
    let view = posts.describe(repost, None).await?;

    state.metrics.record(WriteOp::Repost);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Reposted successfully", "post": view })),
    ))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let post_id = parse_id(&id, "Post")?;
    state.services.posts.delete_post(&user, post_id).await?;

    state.metrics.record(WriteOp::DeletePost);
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}
