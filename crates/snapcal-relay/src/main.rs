mod routes;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use snapcal_core::logging::{LoggingDestination, init_logging};

use crate::state::AppState;

const DEFAULT_PORT: u16 = 4096;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: failed to initialize logging: {err}");
    }

    // Missing credential is fatal before we accept a single request.
    let api_key = std::env::var("SNAPCAL_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .context("SNAPCAL_API_KEY must be set for the relay to start")?;
    let model = std::env::var("SNAPCAL_MODEL")
        .ok()
        .filter(|model| !model.trim().is_empty())
        .unwrap_or_else(|| snapcal_core::config::DEFAULT_MODEL.to_string());

    let port = std::env::var("SNAPCAL_RELAY_PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = AppState::new(api_key, model);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::extract::router())
        .with_state(state)
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("snapcal-relay listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
