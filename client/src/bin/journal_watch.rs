//! Follow a journal live from the command line.
//!
//! Connects to the server named by `JOURNAL_SERVER_URL`, signs in as
//! `JOURNAL_OWNER` and prints every snapshot as a JSON line until Ctrl-C.

use journal_client::{ClientConfig, HttpProvider, JournalSession};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;
    let owner = config.require_owner()?.to_string();
    tracing::info!(server = %config.server_url, owner = %owner, "watching journal");

    let provider = Arc::new(HttpProvider::new(&config.server_url, config.token.clone()));
    let session = JournalSession::new(provider);
    session.init();
    session.identity().sign_in(owner);

    let mut snapshots = session.journal().subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().clone();
                println!("{}", serde_json::to_string(&state)?);
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    session.destroy();
    Ok(())
}
