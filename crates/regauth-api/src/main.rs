//! regauth API Server
//!
//! User account service: registration, login, token refresh and profile.

use anyhow::Context;
use regauth_api::{create_router, state::AppState};
use regauth_core::{AppConfig, LoggingConfig, MemoryUserStore, StoreBackend, UserStore};
use regauth_store::SurrealUserStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "regauth_api={level},regauth_store={level},tower_http={level},audit=info",
            level = logging.level
        )
        .into()
    });

    if logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("REGAUTH_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("loading configuration from {path}"))?,
        Err(_) => AppConfig::from_env().context("loading configuration from environment")?,
    };

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.logging);

    // Refuse to start without a signing secret
    config.validate().context("invalid configuration")?;

    let store: Arc<dyn UserStore> = match config.database.backend {
        StoreBackend::SurrealDb => Arc::new(
            SurrealUserStore::connect(&config.database)
                .await
                .context("connecting to SurrealDB")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory user store; accounts are lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let addr = config.bind_address();
    let state = Arc::new(AppState::from_config(config, store).context("token manager")?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("regauth API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
