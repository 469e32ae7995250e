use serde::{Deserialize, Serialize};

/// A monitored child device as stored under `devices/{childId}`.
///
/// Records are created and maintained by the device app, not this service;
/// every field is therefore optional. The relay only reads a subset and
/// merge-writes `status` / `lastChecked`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Milliseconds since the Unix epoch, set server-side on status updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
}
