use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Trial,
    Pro,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Trial => "trial",
            UserType::Pro => "pro",
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(UserType::Trial),
            "pro" => Ok(UserType::Pro),
            other => Err(format!("unknown user type: {}", other)),
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A licensing grant keyed by a globally unique, immutable `license_key`.
///
/// Trial grants carry `trial_started_at` and an `expire_at` set at
/// creation; `expire_at = None` means the license never expires.
/// The version/download fields are per-license overrides of the
/// process-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub license_key: String,
    pub user_type: UserType,
    pub expire_at: Option<i64>,
    pub trial_started_at: Option<i64>,
    pub max_devices: i64,
    pub notes: Option<String>,
    pub latest_version: Option<String>,
    pub minimum_version: Option<String>,
    pub download_url: Option<String>,
    /// Audit back-reference to the code that produced or last upgraded
    /// this license. Non-owning.
    pub activation_code_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl License {
    /// A trial license is usable only while `expire_at` is strictly in
    /// the future. Expired trials are rejected, never deleted.
    pub fn trial_expired(&self, now: i64) -> bool {
        self.user_type == UserType::Trial
            && self.expire_at.is_some_and(|expire_at| expire_at <= now)
    }
}

#[derive(Debug)]
pub struct CreateLicense {
    pub license_key: String,
    pub user_type: UserType,
    pub expire_at: Option<i64>,
    pub trial_started_at: Option<i64>,
    pub max_devices: i64,
    pub notes: Option<String>,
    pub activation_code_id: Option<String>,
}
