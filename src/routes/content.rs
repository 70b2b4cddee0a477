//! Content generation and retrieval routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::ContentBundle;
use crate::content::{ContentSelector, GenerationRequest};
use crate::routes::{bad_request_response, content_error_response, error_response, json_response};
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    #[serde(flatten)]
    request: GenerationRequest,
    /// `false` turns the call into fire-and-poll: the response carries a
    /// job id instead of the bundle
    #[serde(default = "default_wait")]
    wait: bool,
}

fn default_wait() -> bool {
    true
}

fn bundle_envelope(bundle: &ContentBundle) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "id": bundle.id,
            "story": bundle.story,
            "quiz": bundle.quiz,
            "summary": bundle.summary,
        }),
    )
}

/// POST /api/v1/generate
pub async fn handle_generate(
    req: Request<Incoming>,
    state: Arc<AppState>,
    subject: &str,
) -> Response<Full<Bytes>> {
    let body: GenerateBody = match super::read_json(req).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    if !body.wait {
        let job_id = state
            .orchestrator
            .start(subject.to_string(), body.request);
        return json_response(
            StatusCode::ACCEPTED,
            &serde_json::json!({ "success": true, "jobId": job_id }),
        );
    }

    match state.orchestrator.generate(subject, body.request).await {
        Ok(bundle) => bundle_envelope(&bundle),
        Err(e) => content_error_response(&e),
    }
}

/// GET /api/v1/generate/{jobId}
pub async fn handle_job_status(state: Arc<AppState>, job_id: &str) -> Response<Full<Bytes>> {
    let Ok(job_id) = job_id.parse::<Uuid>() else {
        return bad_request_response("invalid job id");
    };

    match state.orchestrator.job_status(&job_id) {
        Some(job) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "job": job }),
        ),
        None => error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "unknown job id"),
    }
}

/// GET /api/v1/content/latest and GET /api/v1/content/{id}
pub async fn handle_content(state: Arc<AppState>, selector: ContentSelector) -> Response<Full<Bytes>> {
    match state.orchestrator.fetch(selector).await {
        Ok(bundle) => bundle_envelope(&bundle),
        Err(e) => content_error_response(&e),
    }
}

/// GET /api/v1/content - ids of the cached bundles, oldest first
pub async fn handle_content_index(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let ids = state.cache.ids();
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "count": ids.len(),
            "contentIds": ids,
        }),
    )
}

/// Parse the tail of /api/v1/content/{...} into a selector
pub fn parse_content_selector(tail: &str) -> Option<ContentSelector> {
    let tail = tail.trim_matches('/');
    if tail.is_empty() || tail.contains('/') {
        return None;
    }
    if tail == "latest" {
        Some(ContentSelector::Latest)
    } else {
        Some(ContentSelector::Id(tail.to_string()))
    }
}
