#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use soundcards_api::{
    cards::{DeckService, PgSoundCardRepo},
    config::Config,
    db::setup_database,
    graphql::build_schema,
    http::{build_router, RouterOptions},
    logging::init_tracing,
    sound::HttpSoundClient,
};

/// Upper bound for a single sound library request.
const SOUND_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Fail fast on bad configuration, before anything else starts.
    let config = Config::load().map_err(|e| anyhow::anyhow!("{e}"))?;

    init_tracing(&config.logging.level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "soundcards-api starting up"
    );

    let pool = setup_database(&config.database).await?;

    let http_client = reqwest::Client::builder()
        .timeout(SOUND_REQUEST_TIMEOUT)
        .build()
        .context("building sound library HTTP client")?;
    let sounds = HttpSoundClient::with_client(
        http_client,
        config.sound.base_url.clone(),
        config.sound.api_key.clone(),
    );
    tracing::info!(base_url = %config.sound.base_url, "sound library configured");

    let service = DeckService::new(
        Arc::new(PgSoundCardRepo::new(pool)),
        Arc::new(sounds),
        config.game,
    );
    let schema = build_schema(service);

    if config.graphql.playground_enabled {
        tracing::info!("GraphQL playground enabled at GET /graphql");
    }
    let app = build_router(schema, &RouterOptions::from_config(&config));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", config.server.host, config.server.port))?;
    tracing::info!("Starting server at http://{addr}/graphql");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
