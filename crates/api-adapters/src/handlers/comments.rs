use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{CommentThread, DomainError, Page};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{parse_id, ApiJson, CurrentUser, ListQuery};
use crate::metrics::WriteOp;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentThread>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl From<Page<CommentThread>> for CommentPage {
    fn from(page: Page<CommentThread>) -> Self {
        Self {
            comments: page.items,
            current_page: page.current_page,
            total_pages: page.total_pages,
            total: page.total,
        }
    }
}

/// GET /comments/post/{post_id}
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    query: ListQuery,
) -> ApiResult<Json<CommentPage>> {
    let post_id = parse_id(&post_id, "Post")?;
    let page = state.services.comments.list_comments(post_id, query.page).await?;
    Ok(Json(page.into()))
}

/// POST /comments/post/{post_id}
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    ApiJson(body): ApiJson<CreateCommentBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let post_id = parse_id(&post_id, "Post")?;
    let parent = match body.parent_comment_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| DomainError::invalid("Invalid parent comment id"))?,
        ),
    };

    let comments = &state.services.comments;
    let comment = comments
        .create_comment(&user, post_id, body.content.as_deref().unwrap_or_default(), parent)
        .await?;
    let view = comments.describe(comment).await?;

    state.metrics.record(WriteOp::CreateComment);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added", "comment": view })),
    ))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let comment_id = parse_id(&id, "Comment")?;
    state.services.comments.delete_comment(&user, comment_id).await?;

    state.metrics.record(WriteOp::DeleteComment);
    Ok(Json(json!({ "message": "Comment deleted" })))
}
