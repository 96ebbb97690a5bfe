//! spam-rs: classification API server
//!
//! Usage: `spam-rs [config.toml]`. Settings can also be overridden with
//! `SPAM_RS_*` environment variables, e.g. `SPAM_RS_SERVER__LISTEN_ADDR`.

use spam_rs::api::ApiServer;
use spam_rs::history::SqliteHistory;
use spam_rs::inference::{InferenceService, ModelCache};
use spam_rs::Config;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    spam_rs::logging::init(&config.logging);

    info!("Starting spam-rs v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration loaded from {:?}", path),
        None => info!("No config file specified, using defaults and environment"),
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.storage.database_url)
        .await?;
    let history = Arc::new(SqliteHistory::new(pool));
    history.init_db().await?;

    let cache = Arc::new(ModelCache::from_path(&config.model.artifact_path));
    match cache.get_pipeline().await {
        Ok(pipeline) => info!(
            "Model ready: {} features, trained {}",
            pipeline.metadata().vocabulary_size,
            pipeline.metadata().trained_at.to_rfc3339()
        ),
        Err(e) => warn!(
            "Model not loaded at startup ({}); classification is unavailable until an artifact is present",
            e
        ),
    }

    let server = ApiServer::new(
        InferenceService::new(cache),
        history,
        config.server.listen_addr.clone(),
    );
    server.run().await?;

    Ok(())
}
