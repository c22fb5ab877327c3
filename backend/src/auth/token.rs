//! Stateless session tokens.
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(secret, base64url(claims)))`.
//! Nothing is recorded server-side; a token is valid for as long as its
//! signature checks out and its optional expiry has not passed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of generated signing keys.
const GENERATED_SECRET_LEN: usize = 32;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Unique token id
    pub jti: Uuid,
}

/// Issues and verifies signed bearer tokens.
pub struct SessionIssuer {
    secret: Vec<u8>,
    ttl_secs: Option<i64>,
}

impl SessionIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: Option<i64>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs,
        }
    }

    /// Issuer with a random key; its tokens become worthless when the process exits.
    pub fn with_random_secret(ttl_secs: Option<i64>) -> Self {
        use argon2::password_hash::rand_core::{OsRng, RngCore};

        let mut secret = [0u8; GENERATED_SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::new(secret, ttl_secs)
    }

    /// Issue a token asserting `username`.
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: self.ttl_secs.map(|ttl| now.saturating_add(ttl)),
            jti: Uuid::new_v4(),
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| AppError::Internal(format!("Failed to encode claims: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));

        Ok(format!("{}.{}", payload, signature))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let (payload, signature) = token.split_once('.').ok_or_else(invalid_token)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid_token())?;

        let expected = self.sign(payload.as_bytes());
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(invalid_token());
        }

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid_token())?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| invalid_token())?;

        if let Some(exp) = claims.exp {
            if Utc::now().timestamp() >= exp {
                return Err(invalid_token());
            }
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Missing or invalid token".to_string())
}
