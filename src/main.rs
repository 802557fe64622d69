use std::sync::Arc;

use anyhow::Context;
use axum::{Router, http::HeaderValue, http::Method, routing::get};
use flatmatch::config::Config;
use flatmatch::store::SqliteStore;
use flatmatch::{AppState, ws};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flatmatch=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await
        .context("cannot open database")?;

    let store = SqliteStore::new(db_pool);
    store.init().await?;

    let cors = match &config.front_url {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().context("bad FRONT_URL")?)
            .allow_methods([Method::GET, Method::POST])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    };

    let app = Router::new()
        .route("/", get(health))
        .merge(ws::router())
        .with_state(AppState::new(Arc::new(store)))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}
