//! Authentication
//!
//! Bearer JWT validation mapping each request to a stable subject id.
//! Tokens are issued by the main app backend; this gateway only validates.
//! Dev mode substitutes an `x-user-id` header (or a fixed id) so the
//! gateway can run without the token issuer.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};

use hyper::header::AUTHORIZATION;
use hyper::Request;
use tracing::debug;

use crate::types::{GatewayError, Result};

/// Resolve the subject id for a request
pub fn authenticate<B>(
    req: &Request<B>,
    validator: Option<&JwtValidator>,
    dev_mode: bool,
) -> Result<String> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token_from_header);

    if let (Some(token), Some(validator)) = (token, validator) {
        match validator.verify(token) {
            Ok(claims) => return Ok(claims.sub),
            Err(e) if !dev_mode => return Err(e),
            Err(e) => debug!(error = %e, "Token rejected, falling back to dev identity"),
        }
    }

    if dev_mode {
        let subject = req
            .headers()
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("dev-user");
        return Ok(subject.to_string());
    }

    Err(GatewayError::Auth(
        "missing or invalid bearer token".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn request_with_headers(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/v1/generate");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    fn valid_token(sub: &str, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_resolves_subject() {
        let validator = JwtValidator::new("secret");
        let token = valid_token("user-7", "secret");
        let req = request_with_headers(&[("authorization", &format!("Bearer {token}"))]);

        let subject = authenticate(&req, Some(&validator), false).unwrap();
        assert_eq!(subject, "user-7");
    }

    #[test]
    fn test_missing_token_rejected_in_production() {
        let validator = JwtValidator::new("secret");
        let req = request_with_headers(&[]);
        assert!(authenticate(&req, Some(&validator), false).is_err());
    }

    #[test]
    fn test_dev_mode_header_fallback() {
        let validator = JwtValidator::new("secret");

        let req = request_with_headers(&[("x-user-id", "tester")]);
        assert_eq!(authenticate(&req, Some(&validator), true).unwrap(), "tester");

        let req = request_with_headers(&[]);
        assert_eq!(authenticate(&req, Some(&validator), true).unwrap(), "dev-user");
    }

    #[test]
    fn test_invalid_token_rejected_in_production() {
        let validator = JwtValidator::new("secret");
        let token = valid_token("user-7", "wrong-secret");
        let req = request_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        assert!(authenticate(&req, Some(&validator), false).is_err());
    }
}
