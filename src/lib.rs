//! Poll board backend.
//!
//! Signed-in users create polls with a question and up to ten options,
//! anyone can vote, owners edit or delete their own polls and admins can
//! remove any poll.
//!
//! # Layout
//! - `services` holds the use cases as plain orchestration over three ports:
//!   [`store::PollStore`] for the `polls`/`votes` tables,
//!   [`auth::IdentityProvider`] for the session, and [`cache::Revalidate`]
//!   for views that must be refreshed after a write.
//! - `db` and `auth` provide the Postgres adapters for those ports.
//! - `handlers` and `routes` expose the use cases over HTTP. Every response
//!   body carries an `error` field that is `null` on success.
//!
//! # Ownership
//! Updates and deletes filter on poll id *and* owner id inside the same
//! statement, so there is no window between checking ownership and acting.
//!
//! # Setup
//!
//! ```sh
//! export DATABASE_URL=postgres://localhost/polls
//! cargo run
//! ```
use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use thiserror::Error;
use tokio::signal::ctrl_c;
use tracing::{error, info};

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use config::{Config, ConfigError};
use state::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn start_server() -> Result<(), StartupError> {
    let config = Config::load()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&config).await?;
    let state = AppState::from_pool(pool);

    let app = routes::create_routes(state)
        .layer(routes::cors_layer(config.cors_allow_origin.as_deref()));

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server running on {address}");

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    axum_server::bind(address)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
