use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::Envelope;
use crate::startup::AppState;

/// Placeholder returned for device fields the record never reported.
const FIELD_FALLBACK: &str = "N/A";

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ChildDataRequest {
    #[validate(length(min = 1))]
    pub parent_id: String,
    #[validate(length(min = 1))]
    pub child_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildData {
    #[serde(rename = "androidID")]
    pub android_id: String,
    pub android_version: String,
    pub device_name: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn request_child_data(
    State(state): State<AppState>,
    Json(request): Json<ChildDataRequest>,
) -> Result<(StatusCode, Json<Envelope<ChildData>>), AppError> {
    request
        .validate()
        .map_err(|_| AppError::Validation("Parent ID and Child ID are required.".to_string()))?;

    // parentId is required but never scopes the lookup: the store has no
    // parent/child authorization table, so any parent can fetch any child.
    let record = state
        .store
        .fetch_device(&request.child_id)
        .await
        .map_err(|e| AppError::internal("Server error.", e))?
        .ok_or_else(|| AppError::NotFound("Child not found.".to_string()))?;

    tracing::info!(child_id = %request.child_id, "Fetched child device record");

    let data = ChildData {
        android_id: record
            .android_id
            .unwrap_or_else(|| FIELD_FALLBACK.to_string()),
        android_version: record
            .android_version
            .unwrap_or_else(|| FIELD_FALLBACK.to_string()),
        device_name: record
            .device_name
            .unwrap_or_else(|| FIELD_FALLBACK.to_string()),
    };

    Ok((
        StatusCode::OK,
        Json(Envelope::with_data(
            "Child data retrieved successfully.",
            data,
        )),
    ))
}
