//! In-memory content cache

mod store;

pub use store::{CacheConfig, CacheStats, ContentBundle, ContentCache};
