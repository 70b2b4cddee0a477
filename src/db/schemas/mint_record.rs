//! Mint record document schema
//!
//! One record per (user, achievement). The compound unique index is the
//! authority for exactly-once minting; application-level checks are only a
//! fast path.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for mint records
pub const MINT_COLLECTION: &str = "mint_records";

/// A persisted, immutable record of a completed achievement mint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MintRecordDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable subject id of the owning user
    pub user_id: String,

    /// Catalog id of the minted achievement
    pub achievement_id: u32,

    /// Achievement title, denormalized from the catalog at mint time
    pub title: String,

    /// Achievement description, denormalized from the catalog at mint time
    pub description: String,

    /// Badge image reference, denormalized from the catalog at mint time
    pub image_url: String,

    /// Transaction reference from the caller-supplied proof
    pub transaction_ref: String,

    /// Chain explorer URL for the transaction
    pub explorer_url: String,

    /// Contract the token was minted against
    pub contract_ref: String,

    /// Token identifier within the contract
    pub token_ref: String,

    /// Chain the mint happened on
    pub chain: String,

    /// When the gateway accepted the mint
    pub minted_at: DateTime,
}

impl Default for MintRecordDoc {
    fn default() -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            user_id: String::new(),
            achievement_id: 0,
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            transaction_ref: String::new(),
            explorer_url: String::new(),
            contract_ref: String::new(),
            token_ref: String::new(),
            chain: String::new(),
            minted_at: DateTime::from_millis(0),
        }
    }
}

impl MintRecordDoc {
    /// Unique key for the in-memory store mode
    pub fn unique_key(user_id: &str, achievement_id: u32) -> String {
        format!("{user_id}:{achievement_id}")
    }
}

impl IntoIndexes for MintRecordDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One mint per (user, achievement)
            (
                doc! { "user_id": 1, "achievement_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_achievement_unique".to_string())
                        .build(),
                ),
            ),
            // Per-user listing
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MintRecordDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
