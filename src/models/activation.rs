use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// A binding of one device to a license, consuming one unit of the
/// license's device quota. (license_id, device_id) is unique; repeated
/// activation by the same device refreshes `last_seen_at` instead of
/// creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activation {
    pub id: String,
    pub license_id: String,
    pub device_id: String,
    pub device_name: Option<String>,
    pub activated_at: i64,
    pub last_seen_at: i64,
}

/// Client-facing view of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub device_name: Option<String>,
    pub activated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<Activation> for DeviceInfo {
    fn from(a: Activation) -> Self {
        DeviceInfo {
            device_id: a.device_id,
            device_name: a.device_name,
            activated_at: clock::datetime(a.activated_at),
            last_seen_at: clock::datetime(a.last_seen_at),
        }
    }
}
