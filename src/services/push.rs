use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::gauth::{TokenError, TokenSource};

const FCM_API_URL: &str = "https://fcm.googleapis.com/v1/projects";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("send error: {0}")]
    SendFailed(String),

    #[error("authentication error: {0}")]
    Authentication(String),
}

impl From<TokenError> for ProviderError {
    fn from(err: TokenError) -> Self {
        ProviderError::Authentication(err.to_string())
    }
}

/// One push message addressed by device token.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub device_token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Hands the message to the delivery service. Success means accepted
    /// for delivery, not that the device received or acted on it.
    async fn send(&self, push: &PushMessage) -> Result<(), ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[derive(Debug, Serialize)]
struct FcmRequest {
    message: FcmMessage,
}

#[derive(Debug, Serialize)]
struct FcmMessage {
    token: String,
    notification: FcmNotification,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    data: HashMap<String, String>,
    android: FcmAndroidConfig,
}

#[derive(Debug, Serialize)]
struct FcmNotification {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct FcmAndroidConfig {
    priority: String,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    name: Option<String>,
}

/// Push provider speaking the FCM HTTP v1 API.
pub struct FcmProvider {
    project_id: String,
    client: Client,
    auth: Arc<TokenSource>,
}

impl FcmProvider {
    pub fn new(project_id: impl Into<String>, auth: Arc<TokenSource>) -> Self {
        Self {
            project_id: project_id.into(),
            client: Client::new(),
            auth,
        }
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, push: &PushMessage) -> Result<(), ProviderError> {
        if self.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM project_id is not configured".to_string(),
            ));
        }

        let access_token = self.auth.token().await?;

        let request = FcmRequest {
            message: FcmMessage {
                token: push.device_token.clone(),
                notification: FcmNotification {
                    title: push.title.clone(),
                    body: push.body.clone(),
                },
                data: push.data.clone(),
                android: FcmAndroidConfig {
                    priority: "high".to_string(),
                },
            },
        };

        let url = format!("{}/{}/messages:send", FCM_API_URL, self.project_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to connect to FCM: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "FCM API returned status {}: {}",
                status, body
            )));
        }

        let fcm_response: FcmResponse = response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse FCM response: {}", e))
        })?;

        tracing::info!(
            device_token = %push.device_token,
            message_name = fcm_response.name.as_deref().unwrap_or(""),
            "Push message accepted by FCM"
        );

        Ok(())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM project_id is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mock push provider recording every message it was asked to send.
#[derive(Default)]
pub struct MockPushProvider {
    sent: Mutex<Vec<PushMessage>>,
    failing: AtomicBool,
}

impl MockPushProvider {
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send(&self, push: &PushMessage) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::SendFailed(
                "simulated delivery failure".to_string(),
            ));
        }

        tracing::info!(
            device_token = %push.device_token,
            title = %push.title,
            "[MOCK] Push message would be sent"
        );

        self.sent.lock().unwrap().push(push.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
