//! Journal Server - owner-scoped storage for wellness journal entries.
//!
//! Serves each owner's entry collection and time settings over REST and
//! pushes live ordered snapshots to WebSocket subscribers after every
//! write.
//!
//! `journal-server issue-token <owner_id>` creates an API token for an
//! owner and exits.

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod live;
mod routes;

use crate::config::Config;
use crate::db::Pool;
use crate::live::LiveHub;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
    pub live: Arc<LiveHub>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match (command.as_str(), args.next()) {
            ("issue-token", Some(owner_id)) => {
                let token = db::create_token(&pool, &owner_id).await?;
                println!("{}", token);
                Ok(())
            }
            _ => Err("usage: journal-server [issue-token <owner_id>]".into()),
        };
    }

    if config.dev_auth {
        tracing::warn!("DEV_AUTH is set: bearer tokens are trusted as owner IDs");
    }
    tracing::info!("Starting Journal Server on {}:{}", config.host, config.port);

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        live: LiveHub::new_shared(),
    };

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
