//! Store layer over the typed collections
//!
//! Each store runs in one of two modes: Mongo-backed for normal operation,
//! or memory-only (DashMap) for dev mode and unit tests. The memory mode
//! preserves the same uniqueness semantics via atomic entry insertion.

use bson::{doc, oid::ObjectId, DateTime};
use dashmap::DashMap;
use tracing::debug;

use crate::db::mongo::{InsertOutcome, MongoClient, MongoCollection};
use crate::db::schemas::{Metadata, MintRecordDoc, UserProfileDoc, MINT_COLLECTION, USER_COLLECTION};
use crate::types::{GatewayError, Result};

/// Persisted mint records with exactly-once insertion per (user, achievement)
pub struct MintStore {
    collection: Option<MongoCollection<MintRecordDoc>>,
    memory: DashMap<String, MintRecordDoc>,
}

impl MintStore {
    /// Mongo-backed store; applies the compound unique index
    pub async fn with_mongo(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<MintRecordDoc>(MINT_COLLECTION).await?;
        Ok(Self {
            collection: Some(collection),
            memory: DashMap::new(),
        })
    }

    /// Memory-only store for dev mode and tests
    pub fn memory_only() -> Self {
        debug!("MintStore running in memory-only mode");
        Self {
            collection: None,
            memory: DashMap::new(),
        }
    }

    /// Insert a mint record unless one already exists for the same
    /// (user, achievement) pair. The uniqueness decision is made by the
    /// storage layer, not by a prior read.
    pub async fn insert_if_absent(&self, record: MintRecordDoc) -> Result<InsertOutcome> {
        if let Some(collection) = &self.collection {
            return collection.insert_one_unique(record).await;
        }

        let key = MintRecordDoc::unique_key(&record.user_id, record.achievement_id);
        match self.memory.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let mut record = record;
                record.metadata = Metadata::new();
                slot.insert(record);
                Ok(InsertOutcome::Inserted(ObjectId::new()))
            }
        }
    }

    /// Look up the record for one (user, achievement) pair
    pub async fn find(&self, user_id: &str, achievement_id: u32) -> Result<Option<MintRecordDoc>> {
        if let Some(collection) = &self.collection {
            return collection
                .find_one(doc! { "user_id": user_id, "achievement_id": achievement_id })
                .await;
        }

        let key = MintRecordDoc::unique_key(user_id, achievement_id);
        Ok(self.memory.get(&key).map(|r| r.clone()))
    }

    /// All mint records belonging to one user
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<MintRecordDoc>> {
        if let Some(collection) = &self.collection {
            return collection.find_many(doc! { "user_id": user_id }).await;
        }

        Ok(self
            .memory
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect())
    }
}

/// User profiles keyed by subject id
pub struct UserStore {
    collection: Option<MongoCollection<UserProfileDoc>>,
    memory: DashMap<String, UserProfileDoc>,
}

impl UserStore {
    /// Mongo-backed store; applies the unique user_id index
    pub async fn with_mongo(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<UserProfileDoc>(USER_COLLECTION).await?;
        Ok(Self {
            collection: Some(collection),
            memory: DashMap::new(),
        })
    }

    /// Memory-only store for dev mode and tests
    pub fn memory_only() -> Self {
        debug!("UserStore running in memory-only mode");
        Self {
            collection: None,
            memory: DashMap::new(),
        }
    }

    /// Load a profile by subject id
    pub async fn load(&self, user_id: &str) -> Result<Option<UserProfileDoc>> {
        if let Some(collection) = &self.collection {
            return collection.find_one(doc! { "user_id": user_id }).await;
        }

        Ok(self.memory.get(user_id).map(|p| p.clone()))
    }

    /// Store or replace a profile. Used by tests and the dev-mode seed path.
    pub async fn put(&self, profile: UserProfileDoc) -> Result<()> {
        if let Some(collection) = &self.collection {
            let filter = doc! { "user_id": &profile.user_id };
            let serialized = bson::to_document(&profile)
                .map_err(|e| GatewayError::Database(format!("Profile encode failed: {}", e)))?;
            collection
                .inner()
                .update_one(filter, doc! { "$set": serialized })
                .upsert(true)
                .await
                .map_err(|e| GatewayError::Database(format!("Profile upsert failed: {}", e)))?;
            return Ok(());
        }

        self.memory.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    /// Save or replace the linked wallet address, creating the profile if
    /// the subject has none yet
    pub async fn save_wallet(&self, user_id: &str, wallet_address: &str) -> Result<()> {
        if let Some(collection) = &self.collection {
            collection
                .inner()
                .update_one(
                    doc! { "user_id": user_id },
                    doc! {
                        "$set": {
                            "wallet_address": wallet_address,
                            "metadata.updated_at": DateTime::now(),
                        },
                        "$setOnInsert": {
                            "xp": 0i64,
                            "metadata.created_at": DateTime::now(),
                        },
                    },
                )
                .upsert(true)
                .await
                .map_err(|e| GatewayError::Database(format!("Wallet save failed: {}", e)))?;
            return Ok(());
        }

        self.memory
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfileDoc::new(user_id.to_string()))
            .wallet_address = Some(wallet_address.to_string());
        Ok(())
    }
}
