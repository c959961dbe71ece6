//! Identity tokens presented as `Authorization: Bearer <token>`.
//!
//! A token is `{uid}.{expires_unix}.{hex(hmac_sha256)}`, where the MAC covers
//! `v1:{uid}:{expires_unix}` keyed with `FUNCTIONS_TOKEN_SECRET`. The uid may
//! itself contain dots; the last two segments are always expiry and MAC.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use menuboard_core::Uid;

/// Errors produced while minting or verifying a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("signature mismatch")]
    BadSignature,
    #[error("invalid signing key: {0}")]
    Key(String),
}

/// A caller whose identity token verified successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCaller {
    pub uid: Uid,
    /// Unix timestamp after which the token is no longer accepted.
    pub expires_at: i64,
}

/// Signs and verifies identity tokens.
#[derive(Clone)]
pub struct IdTokenVerifier {
    secret: SecretString,
}

impl IdTokenVerifier {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Mint a token for `uid` valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` for a blank uid.
    pub fn mint(&self, uid: &Uid, ttl: Duration) -> Result<String, TokenError> {
        let ttl = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::Malformed)?;
        self.mint_until(uid, Utc::now().timestamp().saturating_add(ttl))
    }

    /// Mint a token for `uid` that expires at the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` for a blank uid.
    pub fn mint_until(&self, uid: &Uid, expires_at: i64) -> Result<String, TokenError> {
        if uid.is_blank() {
            return Err(TokenError::Malformed);
        }
        let signature = self.sign(uid.as_str(), expires_at)?;
        Ok(format!("{uid}.{expires_at}.{signature}"))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is malformed, forged, or expired.
    pub fn verify(&self, token: &str) -> Result<VerifiedCaller, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as of the unix timestamp `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is malformed, forged, or expired.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedCaller, TokenError> {
        let mut parts = token.rsplitn(3, '.');
        let signature = parts.next().ok_or(TokenError::Malformed)?;
        let expires = parts.next().ok_or(TokenError::Malformed)?;
        let uid = parts.next().ok_or(TokenError::Malformed)?;
        if uid.is_empty() {
            return Err(TokenError::Malformed);
        }
        let expires_at: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;
        // Only the form `mint_until` writes; "+2000" or "02000" would parse too.
        if expires_at.to_string() != expires {
            return Err(TokenError::Malformed);
        }

        let expected = self.sign(uid, expires_at)?;
        if !constant_time_compare(&expected, signature) {
            return Err(TokenError::BadSignature);
        }

        // Signature first, so an expired forgery reports as forged.
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        debug!(uid = %uid, "Identity token verified");
        Ok(VerifiedCaller {
            uid: Uid::new(uid),
            expires_at,
        })
    }

    fn sign(&self, uid: &str, expires_at: i64) -> Result<String, TokenError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))?;
        mac.update(format!("v1:{uid}:{expires_at}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Compare two strings without short-circuiting on the first difference.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn verifier() -> IdTokenVerifier {
        IdTokenVerifier::new(SecretString::from("test-token-key-0123456789abcdef"))
    }

    #[test]
    fn test_mint_then_verify() {
        let v = verifier();
        let token = v.mint_until(&Uid::new("u1"), 2_000).unwrap();
        let caller = v.verify_at(&token, 1_000).unwrap();
        assert_eq!(caller.uid, Uid::new("u1"));
        assert_eq!(caller.expires_at, 2_000);
    }

    #[test]
    fn test_uid_with_dots() {
        let v = verifier();
        let token = v.mint_until(&Uid::new("a.b.c"), 2_000).unwrap();
        assert_eq!(v.verify_at(&token, 1_000).unwrap().uid.as_str(), "a.b.c");
    }

    #[test]
    fn test_expired_token_rejected() {
        let v = verifier();
        let token = v.mint_until(&Uid::new("u1"), 2_000).unwrap();
        assert_eq!(v.verify_at(&token, 2_000), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_uid_rejected() {
        let v = verifier();
        let token = v.mint_until(&Uid::new("u1"), 2_000).unwrap();
        let forged = token.replacen("u1", "u2", 1);
        assert_eq!(v.verify_at(&forged, 1_000), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_key_rejected() {
        let token = verifier().mint_until(&Uid::new("u1"), 2_000).unwrap();
        let other = IdTokenVerifier::new(SecretString::from("another-key-fedcba9876543210"));
        assert_eq!(other.verify_at(&token, 1_000), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let v = verifier();
        for token in ["", "abc", "u1.notanumber.deadbeef", ".2000.deadbeef"] {
            assert_eq!(v.verify_at(token, 1_000), Err(TokenError::Malformed), "{token}");
        }
        assert_eq!(v.mint_until(&Uid::new(""), 2_000), Err(TokenError::Malformed));
    }

    #[test]
    fn test_non_canonical_expiry_rejected() {
        let v = verifier();
        let token = v.mint_until(&Uid::new("u1"), 2_000).unwrap();
        for expiry in ["+2000", "02000"] {
            let variant = token.replacen(".2000.", &format!(".{expiry}."), 1);
            assert_eq!(v.verify_at(&variant, 1_000), Err(TokenError::Malformed), "{variant}");
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
