//! User profile document schema
//!
//! Stores XP, wallet linkage, and generation preferences keyed by the
//! subject id carried in the bearer token.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for user profiles
pub const USER_COLLECTION: &str = "users";

/// Stored content-generation preferences
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserPreferences {
    /// Interest → character name mapping used to personalize stories
    #[serde(default)]
    pub interests: BTreeMap<String, String>,

    /// Preferred difficulty (beginner, intermediate, advanced)
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Whether the user wants notification emails
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            interests: BTreeMap::new(),
            difficulty: default_difficulty(),
            notifications: true,
        }
    }
}

/// User profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserProfileDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable subject id from the bearer token
    pub user_id: String,

    /// Experience points earned from completed lessons
    #[serde(default)]
    pub xp: i64,

    /// Linked wallet address, if the user has connected one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    /// Identifiers of completed lessons
    #[serde(default)]
    pub completed_lessons: Vec<String>,

    /// Content-generation preferences
    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

fn default_true() -> bool {
    true
}

impl UserProfileDoc {
    /// Create a new profile with defaults for a previously unseen subject
    pub fn new(user_id: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            xp: 0,
            wallet_address: None,
            completed_lessons: Vec::new(),
            preferences: UserPreferences::default(),
        }
    }

    /// Whether a non-empty wallet address is linked
    pub fn wallet_connected(&self) -> bool {
        self.wallet_address
            .as_deref()
            .map(|w| !w.trim().is_empty())
            .unwrap_or(false)
    }
}

impl IntoIndexes for UserProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
