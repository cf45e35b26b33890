use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use services::ReportSubmission;

use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser};
use crate::metrics::WriteOp;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportBody {
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

/// POST /reports
pub async fn submit_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<ReportBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let submission = ReportSubmission {
        post_id: body.post_id,
        comment_id: body.comment_id,
        reason: body.reason,
        description: body.description,
    };
    state.services.reports.submit_report(&user, submission).await?;

    state.metrics.record(WriteOp::Report);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Report submitted. Thank you for helping keep the community safe."
        })),
    ))
}
