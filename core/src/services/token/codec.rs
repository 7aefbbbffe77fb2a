//! Opaque token generation and keyed digest verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::errors::{DomainError, DomainResult};

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued token pair.
///
/// `raw` goes to the caller exactly once (for email dispatch) and is
/// never persisted or logged; only `digest` is stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// URL-safe token handed to the user
    pub raw: String,
    /// Hex-encoded keyed digest stored in place of the token
    pub digest: String,
}

/// Generates opaque tokens and derives keyed digests for storage.
///
/// The digest is HMAC-SHA256 over the raw token under a server-held
/// secret, so a leaked request table yields nothing verifiable without
/// the key. Rotating the secret invalidates every outstanding token;
/// that is an accepted operational consequence, not a defect - callers
/// see `InvalidToken` and can request a resend.
pub struct TokenCodec {
    secret: Vec<u8>,
    token_length: usize,
}

impl TokenCodec {
    /// Create a codec from the server secret and raw token length.
    pub fn new(secret: impl Into<Vec<u8>>, token_length: usize) -> DomainResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(DomainError::Internal {
                message: "token codec secret must not be empty".to_string(),
            });
        }
        if token_length < 16 {
            return Err(DomainError::Internal {
                message: format!("token length {token_length} below 16-byte minimum"),
            });
        }
        Ok(Self {
            secret,
            token_length,
        })
    }

    /// Issue a new random token and its storage digest.
    pub fn issue(&self) -> DomainResult<IssuedToken> {
        let mut bytes = vec![0u8; self.token_length];
        OsRng.fill_bytes(&mut bytes);
        let raw = URL_SAFE_NO_PAD.encode(&bytes);
        let digest = self.digest(&raw)?;
        Ok(IssuedToken { raw, digest })
    }

    /// Derive the storage digest for a raw token.
    pub fn digest(&self, raw: &str) -> DomainResult<String> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|e| DomainError::Internal {
                message: format!("failed to key token digest: {e}"),
            })?;
        mac.update(raw.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a candidate token against a stored digest.
    ///
    /// The comparison is constant-time regardless of where the digests
    /// differ. Digest length is a public constant, so the early return
    /// on mismatched length leaks nothing useful.
    pub fn verify(&self, raw: &str, stored_digest: &str) -> DomainResult<bool> {
        let expected = self.digest(raw)?;
        if expected.len() != stored_digest.len() {
            return Ok(false);
        }
        Ok(constant_time_eq(
            expected.as_bytes(),
            stored_digest.as_bytes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"server-held-secret".to_vec(), 32).unwrap()
    }

    #[test]
    fn rejects_empty_secret_and_short_tokens() {
        assert!(TokenCodec::new(Vec::new(), 32).is_err());
        assert!(TokenCodec::new(b"secret".to_vec(), 8).is_err());
    }

    #[test]
    fn digest_never_equals_raw_token() {
        let codec = codec();
        for _ in 0..100 {
            let issued = codec.issue().unwrap();
            assert_ne!(issued.raw, issued.digest);
            assert!(codec.verify(&issued.raw, &issued.digest).unwrap());
        }
    }

    #[test]
    fn verify_rejects_foreign_tokens() {
        let codec = codec();
        let issued = codec.issue().unwrap();
        for _ in 0..10_000 {
            let other = codec.issue().unwrap();
            assert!(!codec.verify(&other.raw, &issued.digest).unwrap());
            assert!(!codec.verify(&issued.raw, &other.digest).unwrap());
        }
    }

    #[test]
    fn digest_is_deterministic_per_secret() {
        let codec = codec();
        let issued = codec.issue().unwrap();
        assert_eq!(codec.digest(&issued.raw).unwrap(), issued.digest);
    }

    #[test]
    fn rotating_the_secret_invalidates_digests() {
        let old = codec();
        let new = TokenCodec::new(b"rotated-secret".to_vec(), 32).unwrap();
        let issued = old.issue().unwrap();
        assert!(!new.verify(&issued.raw, &issued.digest).unwrap());
    }

    #[test]
    fn raw_token_length_tracks_configuration() {
        let codec = TokenCodec::new(b"secret-key".to_vec(), 24).unwrap();
        let issued = codec.issue().unwrap();
        // 24 bytes -> 32 base64 chars, no padding
        assert_eq!(issued.raw.len(), 32);
        // HMAC-SHA256 digest is 32 bytes -> 64 hex chars
        assert_eq!(issued.digest.len(), 64);
    }

    #[test]
    fn mismatched_digest_length_is_rejected() {
        let codec = codec();
        let issued = codec.issue().unwrap();
        assert!(!codec.verify(&issued.raw, "deadbeef").unwrap());
    }
}
