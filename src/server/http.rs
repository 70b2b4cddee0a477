//! HTTP server
//!
//! hyper http1 accept loop with method/path match routing. All handlers
//! return a `Full<Bytes>` body; there is no streaming or upgrade surface.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::achievements::AchievementGateway;
use crate::auth::{self, JwtValidator};
use crate::cache::ContentCache;
use crate::config::Args;
use crate::content::Orchestrator;
use crate::db::MongoClient;
use crate::routes;
use crate::routes::content::parse_content_selector;
use crate::types::GatewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    /// Generated content bundles
    pub cache: Arc<ContentCache>,
    /// Drives generations and retrievals
    pub orchestrator: Arc<Orchestrator>,
    /// Mint checks and records
    pub gateway: Arc<AchievementGateway>,
    /// Token validation; None only when no secret is available
    pub jwt: Option<JwtValidator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: Option<MongoClient>,
        cache: Arc<ContentCache>,
        orchestrator: Arc<Orchestrator>,
        gateway: Arc<AchievementGateway>,
    ) -> Self {
        let jwt = args.jwt_secret().map(|secret| JwtValidator::new(&secret));
        Self {
            args,
            mongo,
            cache,
            orchestrator,
            gateway,
            jwt,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Gateway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - relaxed authentication, memory stores");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - 200 whenever the gateway is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe - requires persistence unless in dev mode
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // Static catalog, no auth required
        (Method::GET, "/api/v1/achievements") => routes::handle_catalog().await,

        // Everything else under /api/v1 requires a subject identity
        (Method::POST, "/api/v1/generate") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(subject) => routes::handle_generate(req, Arc::clone(&state), &subject).await,
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::GET, p) if p.starts_with("/api/v1/generate/") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(_) => {
                    let job_id = p.strip_prefix("/api/v1/generate/").unwrap_or("");
                    routes::handle_job_status(Arc::clone(&state), job_id).await
                }
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::GET, "/api/v1/content") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(_) => routes::handle_content_index(Arc::clone(&state)).await,
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::GET, p) if p.starts_with("/api/v1/content/") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(_) => {
                    let tail = p.strip_prefix("/api/v1/content/").unwrap_or("");
                    match parse_content_selector(tail) {
                        Some(selector) => {
                            routes::handle_content(Arc::clone(&state), selector).await
                        }
                        None => routes::bad_request_response("invalid content selector"),
                    }
                }
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::POST, "/api/v1/mint") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(subject) => routes::handle_mint(req, Arc::clone(&state), &subject).await,
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::GET, "/api/v1/achievement-status") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(subject) => routes::handle_status(Arc::clone(&state), &subject).await,
                Err(_) => routes::unauthorized_response(),
            }
        }

        (Method::POST, "/api/v1/wallet") => {
            match auth::authenticate(&req, state.jwt.as_ref(), state.args.dev_mode) {
                Ok(subject) => routes::handle_wallet(req, Arc::clone(&state), &subject).await,
                Err(_) => routes::unauthorized_response(),
            }
        }

        // Not found
        _ => routes::not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}
