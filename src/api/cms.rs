//! Public CMS endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use family_tree_types::{HonorItem, SitePage, SupportMessage, SupportSubmission};

use super::state::AppState;
use crate::error::AppError;

/// GET /api/pages/:slug
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SitePage>, AppError> {
    state
        .cms()
        .page(&slug)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// GET /api/honor
pub async fn list_honor(State(state): State<AppState>) -> Result<Json<Vec<HonorItem>>, AppError> {
    Ok(Json(state.cms().honor_items().await?))
}

/// POST /api/support
pub async fn submit_support(
    State(state): State<AppState>,
    Json(submission): Json<SupportSubmission>,
) -> Result<(StatusCode, Json<SupportMessage>), AppError> {
    if !submission.is_complete() {
        return Err(AppError::bad_request("الاسم والرسالة مطلوبان"));
    }
    let message = state.cms().create_support_message(&submission).await?;
    tracing::info!(id = message.id, "support message received");
    Ok((StatusCode::CREATED, Json(message)))
}
