//! CoinQuest Gateway - content generation and achievement minting

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinquest_gateway::{
    achievements::{AchievementGateway, HttpVerifier, MintVerifier, StructuralVerifier},
    bridge::{ContentEngine, HttpBridge, SubprocessBridge},
    cache::{CacheConfig, ContentCache},
    config::Args,
    content::Orchestrator,
    db::{MintStore, MongoClient, UserStore},
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("coinquest_gateway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  CoinQuest Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Engine: {} ({})", args.engine_mode, match args.engine_mode.as_str() {
        "subprocess" => args.engine_script.clone(),
        _ => args.engine_url.clone(),
    });
    info!("Engine timeout: {}ms", args.engine_timeout_ms);
    info!("Cache capacity: {} bundles", args.cache_max_bundles);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Mint chain: {}", args.mint_chain);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using memory stores): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Stores: Mongo-backed when connected, memory-only otherwise
    let (users, mints) = match &mongo {
        Some(client) => (
            Arc::new(UserStore::with_mongo(client).await?),
            Arc::new(MintStore::with_mongo(client).await?),
        ),
        None => (
            Arc::new(UserStore::memory_only()),
            Arc::new(MintStore::memory_only()),
        ),
    };

    // Content engine adapter
    let engine: Arc<dyn ContentEngine> = match args.engine_mode.as_str() {
        "subprocess" => {
            info!("Content engine: subprocess ({})", args.engine_script);
            Arc::new(SubprocessBridge::new(
                args.engine_interpreter.clone(),
                args.engine_script.clone(),
                args.engine_timeout(),
            ))
        }
        _ => {
            info!("Content engine: http ({})", args.engine_url);
            Arc::new(HttpBridge::new(args.engine_url.clone(), args.engine_timeout())?)
        }
    };

    // Mint proof verification: structural checks, plus the configured
    // confirmation endpoint when one is set
    let verifier: Arc<dyn MintVerifier> = match &args.mint_verify_url {
        Some(url) => {
            info!("Mint verification endpoint: {}", url);
            Arc::new(HttpVerifier::new(url.clone())?)
        }
        None => {
            info!("Mint verification: structural checks only");
            Arc::new(StructuralVerifier)
        }
    };

    let cache = Arc::new(ContentCache::new(CacheConfig {
        max_bundles: args.cache_max_bundles,
    }));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&engine),
        Arc::clone(&cache),
        Arc::clone(&users),
    ));

    let gateway = Arc::new(AchievementGateway::new(
        Arc::clone(&users),
        Arc::clone(&mints),
        verifier,
        args.mint_chain.clone(),
    ));

    let state = Arc::new(server::AppState::new(
        args,
        mongo,
        cache,
        orchestrator,
        gateway,
    ));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
