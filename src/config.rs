//! Configuration for the CoinQuest gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// CoinQuest gateway - content generation and achievement minting
#[derive(Parser, Debug, Clone)]
#[command(name = "coinquest-gateway")]
#[command(about = "Content-generation and achievement-minting gateway for CoinQuest")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (relaxed auth, MongoDB optional, memory stores)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// How to reach the content-generation engine: "subprocess" or "http"
    #[arg(long, env = "ENGINE_MODE", default_value = "http")]
    pub engine_mode: String,

    /// Base URL of the deployed generation engine (http mode)
    #[arg(long, env = "ENGINE_URL", default_value = "http://localhost:8000")]
    pub engine_url: String,

    /// Path to the generator entry script (subprocess mode)
    #[arg(long, env = "ENGINE_SCRIPT", default_value = "GenAI/NovelGenerator.py")]
    pub engine_script: String,

    /// Interpreter used to run the generator script (subprocess mode)
    #[arg(long, env = "ENGINE_INTERPRETER", default_value = "python3")]
    pub engine_interpreter: String,

    /// Engine invocation timeout in milliseconds.
    /// Generation runs multiple model calls, so this is deliberately generous.
    #[arg(long, env = "ENGINE_TIMEOUT_MS", default_value = "120000")]
    pub engine_timeout_ms: u64,

    /// Maximum number of content bundles kept in the in-memory cache.
    /// Oldest bundles are evicted first once the limit is reached.
    #[arg(long, env = "CACHE_MAX_BUNDLES", default_value = "128")]
    pub cache_max_bundles: usize,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "coinquest")]
    pub mongodb_db: String,

    /// JWT secret for bearer token validation (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Chain identifier recorded on new mint records
    #[arg(long, env = "MINT_CHAIN", default_value = "mumbai")]
    pub mint_chain: String,

    /// Optional endpoint used to confirm mint proofs against the chain
    /// explorer before a record is persisted. Unset = structural checks only.
    #[arg(long, env = "MINT_VERIFY_URL")]
    pub mint_verify_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        if self.dev_mode {
            Some(
                self.jwt_secret
                    .clone()
                    .unwrap_or_else(|| "dev-only-insecure-secret".to_string()),
            )
        } else {
            self.jwt_secret.clone()
        }
    }

    /// Engine timeout as a Duration
    pub fn engine_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.engine_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        match self.engine_mode.as_str() {
            "subprocess" | "http" => {}
            other => {
                return Err(format!(
                    "ENGINE_MODE must be \"subprocess\" or \"http\", got \"{other}\""
                ));
            }
        }

        if self.cache_max_bundles == 0 {
            return Err("CACHE_MAX_BUNDLES must be at least 1".to_string());
        }

        if self.engine_timeout_ms == 0 {
            return Err("ENGINE_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["coinquest-gateway", "--dev-mode"])
    }

    #[test]
    fn test_dev_mode_defaults_jwt_secret() {
        let args = base_args();
        assert_eq!(args.jwt_secret().as_deref(), Some("dev-only-insecure-secret"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let args = Args::parse_from(["coinquest-gateway"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["coinquest-gateway", "--jwt-secret", "s3cret"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_engine_mode() {
        let args = Args::parse_from([
            "coinquest-gateway",
            "--dev-mode",
            "--engine-mode",
            "carrier-pigeon",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_cache_capacity() {
        let args = Args::parse_from([
            "coinquest-gateway",
            "--dev-mode",
            "--cache-max-bundles",
            "0",
        ]);
        assert!(args.validate().is_err());
    }
}
