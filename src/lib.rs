//! CoinQuest Gateway - content generation and achievement minting
//!
//! HTTP gateway for a teen financial-education app. Two jobs:
//!
//! - **Content**: drive the out-of-process GenAI story generator and serve
//!   results (story, quiz, summary) from an in-memory cache, with fire-and-
//!   poll support for the long-running generation.
//! - **Achievements**: gate irreversible mint operations behind XP
//!   thresholds and a persistence-level uniqueness guarantee.

pub mod achievements;
pub mod auth;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
