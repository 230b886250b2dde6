//! LevelUp Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use levelup_engine::api::http;
use levelup_engine::infrastructure::game_api::GameApiClient;
use levelup_engine::{App, ProxyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "levelup_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LevelUp Engine");

    let config = ProxyConfig::from_env();
    match &config.game_api_url {
        Some(url) => tracing::info!(game_api_url = %url, "Game API configured"),
        None => tracing::warn!("GAME_API_URL is not set; upstream routes will fail"),
    }

    let game_api = Arc::new(GameApiClient::from_config(&config));
    let app = Arc::new(App::new(game_api));

    let mut router = http::routes().with_state(app);
    if let Some(cors) = config.cors_layer() {
        router = router.layer(cors);
    }
    let router = router.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
