//! HTTP route handlers
//!
//! JSON envelopes are `{success: true, ...}` on success and
//! `{success: false, error, code}` on failure. Error messages derive from
//! the error code; raw upstream diagnostics are logged, never echoed.

pub mod achievements;
pub mod content;
pub mod health;

pub use achievements::{handle_catalog, handle_mint, handle_status, handle_wallet};
pub use content::{handle_content, handle_content_index, handle_generate, handle_job_status};
pub use health::{health_check, readiness_check, version_info};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::achievements::MintError;
use crate::bridge::BridgeError;
use crate::content::ContentError;

/// Serialize a body as a JSON response
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Standard error envelope
pub(crate) fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
) -> Response<Full<Bytes>> {
    json_response(
        status,
        &serde_json::json!({
            "success": false,
            "code": code,
            "error": message,
        }),
    )
}

pub(crate) fn unauthorized_response() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "missing or invalid bearer token",
    )
}

pub(crate) fn bad_request_response(message: &str) -> Response<Full<Bytes>> {
    error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
}

pub(crate) fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    error_response(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        &format!("no route for {path}"),
    )
}

/// Map engine-boundary failures to the wire taxonomy
pub(crate) fn bridge_error_response(err: &BridgeError) -> Response<Full<Bytes>> {
    match err {
        BridgeError::Unavailable(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "UPSTREAM_UNAVAILABLE",
            "content engine is unavailable",
        ),
        BridgeError::Crashed { .. } => error_response(
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_CRASHED",
            "content engine failed",
        ),
        BridgeError::Malformed(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_MALFORMED",
            "content engine returned an invalid payload",
        ),
    }
}

pub(crate) fn content_error_response(err: &ContentError) -> Response<Full<Bytes>> {
    match err {
        // A timed-out engine is reported as unavailable even mid-generation
        ContentError::GenerationFailed(BridgeError::Unavailable(_)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "UPSTREAM_UNAVAILABLE",
            "content engine is unavailable",
        ),
        ContentError::GenerationFailed(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "GENERATION_FAILED",
            "content generation failed",
        ),
        ContentError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "content not found")
        }
        ContentError::Upstream(bridge) => bridge_error_response(bridge),
    }
}

pub(crate) fn mint_error_response(err: &MintError) -> Response<Full<Bytes>> {
    match err {
        MintError::AchievementUnknown(id) => error_response(
            StatusCode::NOT_FOUND,
            "ACHIEVEMENT_UNKNOWN",
            &format!("unknown achievement id: {id}"),
        ),
        MintError::InsufficientXp { required, current } => json_response(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({
                "success": false,
                "code": "INSUFFICIENT_XP",
                "error": "not enough XP for this achievement",
                "required": required,
                "current": current,
            }),
        ),
        MintError::AlreadyMinted => error_response(
            StatusCode::CONFLICT,
            "ALREADY_MINTED",
            "achievement already minted",
        ),
        MintError::MintingFailed(reason) => {
            error_response(StatusCode::BAD_GATEWAY, "MINTING_FAILED", reason)
        }
        MintError::Storage(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "MINTING_FAILED",
            "internal storage error",
        ),
    }
}

/// Read and parse a JSON request body; empty bodies deserialize from `{}`
pub(crate) async fn read_json<T: DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<T, Response<Full<Bytes>>> {
    let bytes = req
        .collect()
        .await
        .map_err(|_| bad_request_response("failed to read request body"))?
        .to_bytes();

    let slice: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
    serde_json::from_slice(slice).map_err(|e| bad_request_response(&format!("invalid JSON: {e}")))
}
