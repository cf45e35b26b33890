use axum::extract::{Path, State};
use axum::Json;
use domains::{DomainError, ReactionKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{parse_id, ApiJson, CurrentUser};
use crate::metrics::WriteOp;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub message: &'static str,
    pub likes: i64,
    pub dislikes: i64,
    pub user_reaction: Option<ReactionKind>,
}

/// POST /reactions/{post_id}: add, toggle off, or switch.
pub async fn react(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    ApiJson(body): ApiJson<ReactionBody>,
) -> ApiResult<Json<ReactionResponse>> {
    let kind: ReactionKind = body
        .kind
        .as_deref()
        .ok_or_else(|| DomainError::invalid("Invalid reaction type"))?
        .parse()?;
    let post_id = parse_id(&post_id, "Post")?;

    let outcome = state
        .services
        .reactions
        .apply_reaction(&user, post_id, kind)
        .await?;

    state.metrics.record(WriteOp::React);
    Ok(Json(ReactionResponse {
        message: outcome.transition.message(),
        likes: outcome.counts.likes,
        dislikes: outcome.counts.dislikes,
        user_reaction: outcome.user_reaction,
    }))
}

/// GET /reactions/{post_id}
pub async fn get_reaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let post_id = parse_id(&post_id, "Post")?;
    let reaction = state.services.reactions.get_reaction(&user, post_id).await?;
    Ok(Json(json!({ "reaction": reaction })))
}
