//! Signed license payload issuance.
//!
//! Every request that returns a license produces a freshly assembled,
//! canonicalized, and signed payload. `issued_at` is always issuance-time
//! now, so two successive envelopes for the same license differ — the
//! signature binds an envelope to its moment of issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::Result;
use crate::models::{License, UserType};
use crate::signing::Signer;

/// Process-wide fallbacks for the per-license version/download overrides.
#[derive(Debug, Clone)]
pub struct IssuerDefaults {
    pub latest_version: String,
    pub minimum_version: String,
    pub download_url: String,
}

/// Current state of a license as transmitted to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePayload {
    pub license_key: String,
    pub user_type: UserType,
    pub expire_at: Option<DateTime<Utc>>,
    pub max_devices: i64,
    pub latest_version: String,
    pub minimum_version: String,
    pub download_url: String,
    pub issued_at: DateTime<Utc>,
    pub trial_remaining_days: Option<i64>,
}

/// Signed wrapper proving the payload was issued by this service and
/// unmodified since issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseEnvelope {
    pub payload: LicensePayload,
    pub signature: String,
}

/// Version/download fields after applying per-license overrides.
#[derive(Debug, Clone)]
pub struct EffectiveVersions {
    pub latest_version: String,
    pub minimum_version: String,
    pub download_url: String,
}

#[derive(Clone)]
pub struct PayloadIssuer {
    signer: Signer,
    defaults: IssuerDefaults,
}

impl PayloadIssuer {
    pub fn new(signer: Signer, defaults: IssuerDefaults) -> Self {
        Self { signer, defaults }
    }

    /// Resolve the license's version gates: per-license override first,
    /// process default otherwise.
    pub fn effective_versions(&self, license: &License) -> EffectiveVersions {
        EffectiveVersions {
            latest_version: license
                .latest_version
                .clone()
                .unwrap_or_else(|| self.defaults.latest_version.clone()),
            minimum_version: license
                .minimum_version
                .clone()
                .unwrap_or_else(|| self.defaults.minimum_version.clone()),
            download_url: license
                .download_url
                .clone()
                .unwrap_or_else(|| self.defaults.download_url.clone()),
        }
    }

    pub fn build_payload(&self, license: &License) -> LicensePayload {
        let versions = self.effective_versions(license);
        LicensePayload {
            license_key: license.license_key.clone(),
            user_type: license.user_type,
            expire_at: license.expire_at.map(clock::datetime),
            max_devices: license.max_devices,
            latest_version: versions.latest_version,
            minimum_version: versions.minimum_version,
            download_url: versions.download_url,
            issued_at: clock::datetime(clock::now_ts()),
            trial_remaining_days: clock::remaining_days(license.expire_at),
        }
    }

    /// Assemble and sign a fresh envelope for the license's current state.
    pub fn issue(&self, license: &License) -> Result<LicenseEnvelope> {
        let payload = self.build_payload(license);
        let signature = self.signer.sign(&canonical_bytes(&payload)?);
        Ok(LicenseEnvelope { payload, signature })
    }

    /// Recompute the signature over a freshly canonicalized payload and
    /// compare constant-time. Part of the contract for downstream
    /// verifiers; no internal code path depends on it.
    pub fn verify(&self, payload: &LicensePayload, signature: &str) -> Result<bool> {
        Ok(self.signer.verify(&canonical_bytes(payload)?, signature))
    }
}

/// Deterministic byte form of a payload: fields ordered lexicographically
/// by name, timestamps as RFC 3339 UTC strings, no insignificant
/// whitespace. serde_json objects are BTreeMaps (the `preserve_order`
/// feature is not enabled), so rendering a Value yields sorted keys.
pub fn canonical_bytes(payload: &LicensePayload) -> Result<Vec<u8>> {
    let value = serde_json::to_value(payload)?;
    Ok(value.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SECONDS_PER_DAY;

    fn test_issuer() -> PayloadIssuer {
        PayloadIssuer::new(
            Signer::new("test-secret"),
            IssuerDefaults {
                latest_version: "2.0.0".to_string(),
                minimum_version: "1.0.0".to_string(),
                download_url: "https://example.com/dl".to_string(),
            },
        )
    }

    fn test_license() -> License {
        let now = clock::now_ts();
        License {
            id: "lic-1".to_string(),
            license_key: "KEY-1".to_string(),
            user_type: UserType::Pro,
            expire_at: Some(now + 30 * SECONDS_PER_DAY),
            trial_started_at: None,
            max_devices: 3,
            notes: None,
            latest_version: None,
            minimum_version: None,
            download_url: None,
            activation_code_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn canonical_bytes_sorts_fields() {
        let issuer = test_issuer();
        let payload = issuer.build_payload(&test_license());
        let text = String::from_utf8(canonical_bytes(&payload).unwrap()).unwrap();

        let download = text.find("\"download_url\"").unwrap();
        let expire = text.find("\"expire_at\"").unwrap();
        let issued = text.find("\"issued_at\"").unwrap();
        let key = text.find("\"license_key\"").unwrap();
        let user_type = text.find("\"user_type\"").unwrap();
        assert!(download < expire && expire < issued && issued < key && key < user_type);
        assert!(!text.contains(": "), "no insignificant whitespace");
    }

    #[test]
    fn envelope_verifies_and_detects_tampering() {
        let issuer = test_issuer();
        let envelope = issuer.issue(&test_license()).unwrap();
        assert!(issuer.verify(&envelope.payload, &envelope.signature).unwrap());

        let mut tampered = envelope.payload.clone();
        tampered.max_devices = 100;
        assert!(!issuer.verify(&tampered, &envelope.signature).unwrap());
    }

    #[test]
    fn resigning_unmodified_payload_is_identical() {
        let issuer = test_issuer();
        let envelope = issuer.issue(&test_license()).unwrap();
        let signer = Signer::new("test-secret");
        let again = signer.sign(&canonical_bytes(&envelope.payload).unwrap());
        assert_eq!(envelope.signature, again);
    }

    #[test]
    fn per_license_overrides_take_precedence() {
        let issuer = test_issuer();
        let mut license = test_license();
        license.latest_version = Some("9.9.9".to_string());
        let payload = issuer.build_payload(&license);
        assert_eq!(payload.latest_version, "9.9.9");
        assert_eq!(payload.minimum_version, "1.0.0");
    }

    #[test]
    fn trial_remaining_days_present_only_with_expiry() {
        let issuer = test_issuer();
        let mut license = test_license();
        let payload = issuer.build_payload(&license);
        let days = payload.trial_remaining_days.unwrap();
        assert!((29..=30).contains(&days), "expected ~30 days, got {}", days);

        license.expire_at = None;
        let payload = issuer.build_payload(&license);
        assert_eq!(payload.trial_remaining_days, None);
    }
}
