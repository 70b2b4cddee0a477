//! Achievement catalog and minting gateway

pub mod catalog;
mod gateway;

pub use catalog::{Achievement, Category, Level, CATALOG};
pub use gateway::{
    AchievementGateway, HttpVerifier, MintError, MintProof, MintVerifier, StructuralVerifier,
    UserAchievementState,
};
