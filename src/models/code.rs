use serde::{Deserialize, Serialize};

use super::UserType;

/// A redeemable grant template. Redeeming the code creates or upgrades
/// the license whose key equals the code string.
///
/// `expires_at` bounds the code's own redeemability; `valid_days` sets
/// the lifetime of the granted license, counted from redemption time
/// (None = non-expiring grant). `used_count` never exceeds `usage_limit`
/// when a limit is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCode {
    pub id: String,
    pub code: String,
    pub user_type: UserType,
    pub valid_days: Option<i64>,
    pub max_devices: i64,
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub expires_at: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug)]
pub struct CreateActivationCode {
    pub code: String,
    pub user_type: UserType,
    pub valid_days: Option<i64>,
    pub max_devices: i64,
    pub usage_limit: Option<i64>,
    pub expires_at: Option<i64>,
    pub notes: Option<String>,
}
