//! JWT validation
//!
//! Tokens are issued elsewhere; this gateway only validates them and maps
//! them to a stable subject id. HS256 with a shared secret.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{GatewayError, Result};

/// Claims carried by a gateway bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable subject id
    pub sub: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| GatewayError::Auth(format!("invalid token: {e}")))?;
        Ok(data.claims)
    }
}

/// Pull the bearer token out of an Authorization header value
pub fn extract_token_from_header(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
