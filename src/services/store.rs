use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::gauth::{TokenError, TokenSource};
use crate::models::DeviceRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("store request failed: {0}")]
    RequestFailed(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("malformed device record: {0}")]
    Malformed(String),
}

impl From<TokenError> for StoreError {
    fn from(err: TokenError) -> Self {
        StoreError::Authentication(err.to_string())
    }
}

/// Document store holding device records under `devices/{childId}`.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Point read of `devices/{child_id}`. `Ok(None)` when no record exists.
    async fn fetch_device(&self, child_id: &str) -> Result<Option<DeviceRecord>, StoreError>;

    /// Reads `devices/{child_id}/fcmToken`. `Ok(None)` when unset or empty.
    async fn fetch_push_token(&self, child_id: &str) -> Result<Option<String>, StoreError>;

    /// Merge-writes `status` and `lastChecked` onto the record, leaving
    /// unrelated fields untouched. Creates the record if absent.
    async fn update_status(
        &self,
        child_id: &str,
        status: &str,
        last_checked: i64,
    ) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Firebase Realtime Database client speaking the REST API.
pub struct RtdbStore {
    base_url: String,
    client: reqwest::Client,
    auth: Arc<TokenSource>,
}

impl RtdbStore {
    pub fn new(database_url: &str, auth: Arc<TokenSource>) -> Self {
        Self {
            base_url: database_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            auth,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, StoreError> {
        let token = self.auth.token().await?;
        let url = format!("{}/{}.json", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("GET {}: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!(
                "GET {} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DeviceStore for RtdbStore {
    async fn fetch_device(&self, child_id: &str) -> Result<Option<DeviceRecord>, StoreError> {
        let value = self.get_json(&format!("devices/{}", child_id)).await?;

        // The REST API answers `null` for absent paths.
        if value.is_null() {
            return Ok(None);
        }

        let record =
            serde_json::from_value(value).map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(Some(record))
    }

    async fn fetch_push_token(&self, child_id: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .get_json(&format!("devices/{}/fcmToken", child_id))
            .await?;

        match value {
            Value::Null => Ok(None),
            Value::String(token) if token.is_empty() => Ok(None),
            Value::String(token) => Ok(Some(token)),
            other => Err(StoreError::Malformed(format!(
                "fcmToken is not a string: {}",
                other
            ))),
        }
    }

    async fn update_status(
        &self,
        child_id: &str,
        status: &str,
        last_checked: i64,
    ) -> Result<(), StoreError> {
        let token = self.auth.token().await?;
        let path = format!("devices/{}", child_id);
        let url = format!("{}/{}.json", self.base_url, path);
        let body = json!({ "status": status, "lastChecked": last_checked });

        // PATCH merges the given fields and preserves the rest of the record.
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("PATCH {}: {}", path, e)))?;

        if !response.status().is_success() {
            let status_code = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!(
                "PATCH {} returned {}: {}",
                path, status_code, body
            )));
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        // A mintable token means credentials are valid and Google reachable.
        self.auth.token().await?;
        Ok(())
    }
}

/// In-memory store used in tests and when Firebase is disabled.
#[derive(Default)]
pub struct MemoryDeviceStore {
    devices: Mutex<HashMap<String, DeviceRecord>>,
    failing: AtomicBool,
}

impl MemoryDeviceStore {
    pub fn insert(&self, child_id: impl Into<String>, record: DeviceRecord) {
        self.devices
            .lock()
            .unwrap()
            .insert(child_id.into(), record);
    }

    pub fn get(&self, child_id: &str) -> Option<DeviceRecord> {
        self.devices.lock().unwrap().get(child_id).cloned()
    }

    /// Makes every subsequent operation fail, to exercise 500 paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "simulated store outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn fetch_device(&self, child_id: &str) -> Result<Option<DeviceRecord>, StoreError> {
        self.check_available()?;
        Ok(self.get(child_id))
    }

    async fn fetch_push_token(&self, child_id: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self
            .get(child_id)
            .and_then(|record| record.fcm_token)
            .filter(|token| !token.is_empty()))
    }

    async fn update_status(
        &self,
        child_id: &str,
        status: &str,
        last_checked: i64,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let mut devices = self.devices.lock().unwrap();
        let record = devices.entry(child_id.to_string()).or_default();
        record.status = Some(status.to_string());
        record.last_checked = Some(last_checked);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_status_merges_onto_existing_record() {
        let store = MemoryDeviceStore::default();
        store.insert(
            "childA",
            DeviceRecord {
                android_id: Some("abc".to_string()),
                device_name: Some("Pixel".to_string()),
                status: Some("offline".to_string()),
                ..Default::default()
            },
        );

        store.update_status("childA", "online", 1_700_000_000_000).await.unwrap();

        let record = store.get("childA").unwrap();
        assert_eq!(record.status.as_deref(), Some("online"));
        assert_eq!(record.last_checked, Some(1_700_000_000_000));
        assert_eq!(record.android_id.as_deref(), Some("abc"));
        assert_eq!(record.device_name.as_deref(), Some("Pixel"));
    }

    #[tokio::test]
    async fn update_status_creates_missing_record() {
        let store = MemoryDeviceStore::default();
        store.update_status("new-child", "online", 42).await.unwrap();

        let record = store.get("new-child").unwrap();
        assert_eq!(record.status.as_deref(), Some("online"));
        assert_eq!(record.last_checked, Some(42));
    }

    #[tokio::test]
    async fn empty_token_reads_as_absent() {
        let store = MemoryDeviceStore::default();
        store.insert(
            "childA",
            DeviceRecord {
                fcm_token: Some(String::new()),
                ..Default::default()
            },
        );

        assert_eq!(store.fetch_push_token("childA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_store_surfaces_errors() {
        let store = MemoryDeviceStore::default();
        store.set_failing(true);

        assert!(store.fetch_device("childA").await.is_err());
        assert!(store.update_status("childA", "online", 1).await.is_err());
    }
}
