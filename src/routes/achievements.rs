//! Achievement and minting routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::achievements::{MintProof, CATALOG};
use crate::db::schemas::MintRecordDoc;
use crate::routes::{json_response, mint_error_response};
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintBody {
    achievement_id: u32,
    proof: MintProof,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletBody {
    wallet_address: String,
}

fn record_json(record: &MintRecordDoc) -> serde_json::Value {
    serde_json::json!({
        "achievementId": record.achievement_id,
        "title": record.title,
        "description": record.description,
        "imageUrl": record.image_url,
        "transactionRef": record.transaction_ref,
        "explorerUrl": record.explorer_url,
        "contractRef": record.contract_ref,
        "tokenRef": record.token_ref,
        "chain": record.chain,
        "mintedAt": record.minted_at.try_to_rfc3339_string().unwrap_or_default(),
    })
}

/// POST /api/v1/mint
pub async fn handle_mint(
    req: Request<Incoming>,
    state: Arc<AppState>,
    subject: &str,
) -> Response<Full<Bytes>> {
    let body: MintBody = match super::read_json(req).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    match state
        .gateway
        .mint(subject, body.achievement_id, body.proof)
        .await
    {
        Ok(record) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "mintRecord": record_json(&record) }),
        ),
        Err(e) => mint_error_response(&e),
    }
}

/// GET /api/v1/achievement-status
pub async fn handle_status(state: Arc<AppState>, subject: &str) -> Response<Full<Bytes>> {
    match state.gateway.status(subject).await {
        Ok(status) => {
            let minted_ids: Vec<u32> = status.minted.keys().copied().collect();
            json_response(
                StatusCode::OK,
                &serde_json::json!({
                    "success": true,
                    "xp": status.xp,
                    "walletAddress": status.wallet_address,
                    "walletConnected": status.wallet_connected,
                    "mintedAchievementIds": minted_ids,
                    "minted": status.minted,
                }),
            )
        }
        Err(e) => mint_error_response(&e),
    }
}

/// GET /api/v1/achievements (public)
pub async fn handle_catalog() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({ "success": true, "achievements": CATALOG }),
    )
}

/// POST /api/v1/wallet
pub async fn handle_wallet(
    req: Request<Incoming>,
    state: Arc<AppState>,
    subject: &str,
) -> Response<Full<Bytes>> {
    let body: WalletBody = match super::read_json(req).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    match state.gateway.save_wallet(subject, &body.wallet_address).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "walletAddress": body.wallet_address }),
        ),
        Err(e) => mint_error_response(&e),
    }
}
