use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

use crate::error::AppError;
use crate::models::Envelope;
use crate::services::PushMessage;
use crate::startup::AppState;

/// Machine-readable action tag the device app dispatches on.
const CHECK_INTERNET_ACTION: &str = "CHECK_INTERNET_STATUS";

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckStatusRequest {
    #[validate(length(min = 1))]
    pub child_id: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub child_id: String,
    #[validate(length(min = 1))]
    pub status: String,
}

/// Asks the child device to verify connectivity via a push message. A 200
/// only confirms the message was accepted for delivery.
#[tracing::instrument(skip(state, request))]
pub async fn check_internet_status(
    State(state): State<AppState>,
    Json(request): Json<CheckStatusRequest>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    request
        .validate()
        .map_err(|_| AppError::Validation("Child ID is required.".to_string()))?;

    let token = state
        .store
        .fetch_push_token(&request.child_id)
        .await
        .map_err(|e| AppError::internal("Failed to send request to the child device.", e))?
        .ok_or_else(|| {
            AppError::NotFound("FCM Token not found for the child device.".to_string())
        })?;

    let message = PushMessage {
        device_token: token,
        title: "Check Internet Connection".to_string(),
        body: "Please verify if you're online.".to_string(),
        data: HashMap::from([("action".to_string(), CHECK_INTERNET_ACTION.to_string())]),
    };

    state
        .push
        .send(&message)
        .await
        .map_err(|e| AppError::internal("Failed to send request to the child device.", e))?;

    tracing::info!(child_id = %request.child_id, "Internet status check requested");

    Ok((
        StatusCode::OK,
        Json(Envelope::success(
            "Request sent to the child device to check internet status.",
        )),
    ))
}

/// Records a connectivity status reported for a child device, stamping the
/// record with the server's current time.
#[tracing::instrument(skip(state, request))]
pub async fn update_internet_status(
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    request
        .validate()
        .map_err(|_| AppError::Validation("Child ID and status are required.".to_string()))?;

    let last_checked = Utc::now().timestamp_millis();

    state
        .store
        .update_status(&request.child_id, &request.status, last_checked)
        .await
        .map_err(|e| AppError::internal("Failed to update internet status.", e))?;

    tracing::info!(
        child_id = %request.child_id,
        status = %request.status,
        "Internet status updated"
    );

    Ok((
        StatusCode::OK,
        Json(Envelope::success("Internet status updated successfully.")),
    ))
}
