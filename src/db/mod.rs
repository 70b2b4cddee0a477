//! Persistence layer
//!
//! Typed MongoDB collections with schema-declared indexes, plus a store
//! layer that can run memory-only when no database is configured.

pub mod mongo;
pub mod schemas;
pub mod stores;

pub use mongo::{InsertOutcome, IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use stores::{MintStore, UserStore};
