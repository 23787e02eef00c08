//! Keyed message authentication for issued license payloads.
//!
//! The signer holds the process-wide secret and produces URL-safe base64
//! HMAC-SHA-256 signatures over canonical payload bytes. Verification
//! recomputes the signature and compares constant-time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Sign canonical payload bytes. Deterministic: identical bytes yield
    /// an identical signature.
    pub fn sign(&self, bytes: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(bytes);
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// Verify a signature against canonical payload bytes.
    ///
    /// The length check is not constant-time, but signature length is not
    /// secret (always 44 base64 chars for SHA-256).
    pub fn verify(&self, bytes: &[u8], signature: &str) -> bool {
        let expected = self.sign(bytes);
        let expected = expected.as_bytes();
        let provided = signature.as_bytes();
        if expected.len() != provided.len() {
            return false;
        }
        expected.ct_eq(provided).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_is_deterministic() {
        let signer = Signer::new("test-secret");
        let a = signer.sign(b"payload");
        let b = signer.sign(b"payload");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_change_signature() {
        let signer = Signer::new("test-secret");
        assert_ne!(signer.sign(b"payload"), signer.sign(b"payloae"));
    }

    #[test]
    fn different_secret_changes_signature() {
        assert_ne!(
            Signer::new("secret-a").sign(b"payload"),
            Signer::new("secret-b").sign(b"payload"),
        );
    }

    #[test]
    fn verify_round_trip() {
        let signer = Signer::new("test-secret");
        let sig = signer.sign(b"payload");
        assert!(signer.verify(b"payload", &sig));
        assert!(!signer.verify(b"tampered", &sig));
        assert!(!signer.verify(b"payload", "not-a-signature"));
    }
}
