//! Achievement minting gateway
//!
//! Gates the irreversible mint behind ordered checks and delegates the
//! exactly-once guarantee to the mint store's unique insert. The fast-path
//! existing-record check only improves latency; two racing requests are
//! decided by the storage layer.

use async_trait::async_trait;
use bson::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::achievements::catalog;
use crate::db::schemas::{MintRecordDoc, UserProfileDoc};
use crate::db::{InsertOutcome, MintStore, UserStore};
use crate::types::GatewayError;

/// Failures of the mint operation, in check order
#[derive(Debug, Error)]
pub enum MintError {
    #[error("Unknown achievement id: {0}")]
    AchievementUnknown(u32),

    #[error("Insufficient XP: requires {required}, have {current}")]
    InsufficientXp { required: u32, current: i64 },

    #[error("Achievement already minted")]
    AlreadyMinted,

    #[error("Minting failed: {0}")]
    MintingFailed(String),

    #[error(transparent)]
    Storage(#[from] GatewayError),
}

/// Caller-supplied evidence of the completed on-chain mint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintProof {
    pub transaction_ref: String,
    pub explorer_url: String,
    pub contract_ref: String,
    pub token_ref: String,
}

/// Derived per-user view: XP, wallet linkage, and what has been minted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAchievementState {
    pub xp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub wallet_connected: bool,
    /// Achievement id → explorer URL of the recorded transaction
    pub minted: BTreeMap<u32, String>,
}

/// Seam for confirming a mint proof before it is recorded
#[async_trait]
pub trait MintVerifier: Send + Sync {
    async fn verify(&self, proof: &MintProof) -> Result<(), String>;
}

/// Structural validation only: every proof field present and the explorer
/// link shaped like a URL. Used when no verification endpoint is configured.
pub struct StructuralVerifier;

#[async_trait]
impl MintVerifier for StructuralVerifier {
    async fn verify(&self, proof: &MintProof) -> Result<(), String> {
        let fields = [
            ("transactionRef", &proof.transaction_ref),
            ("explorerUrl", &proof.explorer_url),
            ("contractRef", &proof.contract_ref),
            ("tokenRef", &proof.token_ref),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("proof field '{name}' is empty"));
            }
        }
        if !proof.explorer_url.contains("://") {
            return Err("explorerUrl is not a URL".to_string());
        }
        Ok(())
    }
}

/// Confirms the transaction against a configured verification endpoint
pub struct HttpVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpVerifier {
    pub fn new(url: String) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("verifier client init failed: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl MintVerifier for HttpVerifier {
    async fn verify(&self, proof: &MintProof) -> Result<(), String> {
        // Structural checks first so the endpoint never sees garbage
        StructuralVerifier.verify(proof).await?;

        // Transport and status detail is logged here; the caller-facing
        // message stays fixed so raw client errors never reach the wire
        let response = match self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "transactionRef": proof.transaction_ref,
                "contractRef": proof.contract_ref,
                "tokenRef": proof.token_ref,
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Mint verification endpoint unreachable");
                return Err("verification endpoint unreachable".to_string());
            }
        };

        if response.status().is_success() {
            Ok(())
        } else {
            warn!(status = %response.status(), "Mint verification endpoint rejected proof");
            Err("proof rejected by verification endpoint".to_string())
        }
    }
}

pub struct AchievementGateway {
    users: Arc<UserStore>,
    mints: Arc<MintStore>,
    verifier: Arc<dyn MintVerifier>,
    chain: String,
}

impl AchievementGateway {
    pub fn new(
        users: Arc<UserStore>,
        mints: Arc<MintStore>,
        verifier: Arc<dyn MintVerifier>,
        chain: String,
    ) -> Self {
        Self {
            users,
            mints,
            verifier,
            chain,
        }
    }

    /// Record an achievement mint. Checks run in order and short-circuit;
    /// the unique insert at the end is the authority under races.
    pub async fn mint(
        &self,
        subject: &str,
        achievement_id: u32,
        proof: MintProof,
    ) -> Result<MintRecordDoc, MintError> {
        let achievement = catalog::lookup(achievement_id)
            .ok_or(MintError::AchievementUnknown(achievement_id))?;

        let profile = self
            .users
            .load(subject)
            .await?
            .unwrap_or_else(|| UserProfileDoc::new(subject.to_string()));

        if profile.xp < achievement.xp_required as i64 {
            return Err(MintError::InsufficientXp {
                required: achievement.xp_required,
                current: profile.xp,
            });
        }

        // Fast path; the unique index below is what actually decides
        if self.mints.find(subject, achievement_id).await?.is_some() {
            return Err(MintError::AlreadyMinted);
        }

        if !profile.wallet_connected() {
            return Err(MintError::MintingFailed("wallet not connected".to_string()));
        }

        self.verifier
            .verify(&proof)
            .await
            .map_err(MintError::MintingFailed)?;

        let record = MintRecordDoc {
            user_id: subject.to_string(),
            achievement_id,
            title: achievement.title.to_string(),
            description: achievement.description.to_string(),
            image_url: achievement.image_ref.to_string(),
            transaction_ref: proof.transaction_ref,
            explorer_url: proof.explorer_url,
            contract_ref: proof.contract_ref,
            token_ref: proof.token_ref,
            chain: self.chain.clone(),
            minted_at: DateTime::now(),
            ..Default::default()
        };

        match self.mints.insert_if_absent(record.clone()).await {
            Ok(InsertOutcome::Inserted(_)) => {
                info!(%subject, achievement_id, "Achievement minted");
                Ok(record)
            }
            Ok(InsertOutcome::Duplicate) => Err(MintError::AlreadyMinted),
            Err(e) => {
                // The chain transaction is confirmed but the record is not
                // durable; flag it for reconciliation and let the caller
                // retry with the same proof
                error!(
                    %subject,
                    achievement_id,
                    transaction_ref = %record.transaction_ref,
                    error = %e,
                    reconciliation = true,
                    "Mint confirmed but record not persisted"
                );
                Err(MintError::MintingFailed(
                    "mint record not persisted, retry with the same proof".to_string(),
                ))
            }
        }
    }

    /// Current achievement standing for one user. Reads stores directly,
    /// never cached, so it is idempotent between mints.
    pub async fn status(&self, subject: &str) -> Result<UserAchievementState, MintError> {
        let profile = self
            .users
            .load(subject)
            .await?
            .unwrap_or_else(|| UserProfileDoc::new(subject.to_string()));

        let records = self.mints.list_for_user(subject).await?;
        let minted: BTreeMap<u32, String> = records
            .into_iter()
            .map(|r| (r.achievement_id, r.explorer_url))
            .collect();

        Ok(UserAchievementState {
            xp: profile.xp,
            wallet_connected: profile.wallet_connected(),
            wallet_address: profile.wallet_address,
            minted,
        })
    }

    /// Link a wallet address to the subject's profile
    pub async fn save_wallet(&self, subject: &str, wallet_address: &str) -> Result<(), MintError> {
        if wallet_address.trim().is_empty() {
            return Err(MintError::MintingFailed("wallet address is empty".to_string()));
        }
        self.users.save_wallet(subject, wallet_address).await?;
        info!(%subject, "Wallet address saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingVerifier;

    #[async_trait]
    impl MintVerifier for RejectingVerifier {
        async fn verify(&self, _proof: &MintProof) -> Result<(), String> {
            Err("transaction not found on chain".to_string())
        }
    }

    fn proof() -> MintProof {
        MintProof {
            transaction_ref: "0xdeadbeef".to_string(),
            explorer_url: "https://mumbai.polygonscan.com/tx/0xdeadbeef".to_string(),
            contract_ref: "0xc0ffee".to_string(),
            token_ref: "42".to_string(),
        }
    }

    async fn gateway_with_user(xp: i64, wallet: Option<&str>) -> (Arc<UserStore>, Arc<MintStore>, AchievementGateway) {
        let users = Arc::new(UserStore::memory_only());
        let mints = Arc::new(MintStore::memory_only());

        let mut profile = UserProfileDoc::new("u1".to_string());
        profile.xp = xp;
        profile.wallet_address = wallet.map(str::to_string);
        users.put(profile).await.unwrap();

        let gateway = AchievementGateway::new(
            users.clone(),
            mints.clone(),
            Arc::new(StructuralVerifier),
            "mumbai".to_string(),
        );
        (users, mints, gateway)
    }

    #[tokio::test]
    async fn test_xp_threshold_both_sides() {
        // Achievement 1 requires 100 XP
        let (users, _, gateway) = gateway_with_user(90, Some("0xabc")).await;

        match gateway.mint("u1", 1, proof()).await {
            Err(MintError::InsufficientXp { required, current }) => {
                assert_eq!(required, 100);
                assert_eq!(current, 90);
            }
            other => panic!("expected InsufficientXp, got {other:?}"),
        }

        let mut profile = users.load("u1").await.unwrap().unwrap();
        profile.xp = 100;
        users.put(profile).await.unwrap();

        let record = gateway.mint("u1", 1, proof()).await.unwrap();
        assert_eq!(record.achievement_id, 1);
        assert_eq!(record.title, "Budget Basics");
        assert_eq!(record.chain, "mumbai");
    }

    #[tokio::test]
    async fn test_unknown_achievement() {
        let (_, _, gateway) = gateway_with_user(10_000, Some("0xabc")).await;
        assert!(matches!(
            gateway.mint("u1", 999, proof()).await,
            Err(MintError::AchievementUnknown(999))
        ));
    }

    #[tokio::test]
    async fn test_repeat_mint_is_already_minted() {
        let (_, _, gateway) = gateway_with_user(10_000, Some("0xabc")).await;

        gateway.mint("u1", 1, proof()).await.unwrap();
        assert!(matches!(
            gateway.mint("u1", 1, proof()).await,
            Err(MintError::AlreadyMinted)
        ));

        // A different achievement is still mintable
        assert!(gateway.mint("u1", 2, proof()).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_double_mint_yields_one_record() {
        let users = Arc::new(UserStore::memory_only());
        let mints = Arc::new(MintStore::memory_only());
        let mut profile = UserProfileDoc::new("u1".to_string());
        profile.xp = 10_000;
        profile.wallet_address = Some("0xabc".to_string());
        users.put(profile).await.unwrap();

        let gateway = Arc::new(AchievementGateway::new(
            users,
            mints.clone(),
            Arc::new(StructuralVerifier),
            "mumbai".to_string(),
        ));

        let a = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.mint("u1", 1, proof()).await })
        };
        let b = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.mint("u1", 1, proof()).await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert_eq!(mints.list_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_required_before_verification() {
        let (_, mints, gateway) = gateway_with_user(10_000, None).await;

        match gateway.mint("u1", 1, proof()).await {
            Err(MintError::MintingFailed(reason)) => {
                assert!(reason.contains("wallet"));
            }
            other => panic!("expected MintingFailed, got {other:?}"),
        }
        assert!(mints.list_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verifier_rejection_leaves_no_state() {
        let users = Arc::new(UserStore::memory_only());
        let mints = Arc::new(MintStore::memory_only());
        let mut profile = UserProfileDoc::new("u1".to_string());
        profile.xp = 10_000;
        profile.wallet_address = Some("0xabc".to_string());
        users.put(profile).await.unwrap();

        let gateway = AchievementGateway::new(
            users,
            mints.clone(),
            Arc::new(RejectingVerifier),
            "mumbai".to_string(),
        );

        assert!(matches!(
            gateway.mint("u1", 1, proof()).await,
            Err(MintError::MintingFailed(_))
        ));
        assert!(mints.list_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structural_verifier_rejects_empty_fields() {
        let mut bad = proof();
        bad.transaction_ref = "  ".to_string();
        assert!(StructuralVerifier.verify(&bad).await.is_err());

        let mut bad = proof();
        bad.explorer_url = "not-a-url".to_string();
        assert!(StructuralVerifier.verify(&bad).await.is_err());

        assert!(StructuralVerifier.verify(&proof()).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_verifier_failure_message_carries_no_transport_detail() {
        // Nothing listens on this port; the connection is refused
        let verifier = HttpVerifier::new("http://127.0.0.1:9".to_string()).unwrap();

        let message = verifier.verify(&proof()).await.unwrap_err();
        assert_eq!(message, "verification endpoint unreachable");
    }

    #[tokio::test]
    async fn test_status_is_idempotent_between_mints() {
        let (_, _, gateway) = gateway_with_user(150, Some("0xabc")).await;

        let before = gateway.status("u1").await.unwrap();
        let again = gateway.status("u1").await.unwrap();
        assert_eq!(before.xp, again.xp);
        assert_eq!(before.minted, again.minted);
        assert!(before.wallet_connected);
        assert!(before.minted.is_empty());

        gateway.mint("u1", 1, proof()).await.unwrap();

        let after = gateway.status("u1").await.unwrap();
        assert_eq!(after.minted.len(), 1);
        assert!(after.minted[&1].contains("polygonscan"));
    }

    #[tokio::test]
    async fn test_status_for_unknown_user_is_default() {
        let (_, _, gateway) = gateway_with_user(0, None).await;
        let state = gateway.status("stranger").await.unwrap();
        assert_eq!(state.xp, 0);
        assert!(!state.wallet_connected);
        assert!(state.minted.is_empty());
    }
}
