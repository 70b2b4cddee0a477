//! Database schemas for the gateway
//!
//! Defines MongoDB document structures for user profiles and mint records.

mod metadata;
mod mint_record;
mod user;

pub use metadata::Metadata;
pub use mint_record::{MintRecordDoc, MINT_COLLECTION};
pub use user::{UserPreferences, UserProfileDoc, USER_COLLECTION};
