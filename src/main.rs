//! Mini Golf Back binary entrypoint wiring REST, SSE, and the persistence layers.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_golf_back::{
    config::AppConfig,
    dao::game_store::local::LocalGameStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let local = match config.local_store_path() {
        Some(path) => LocalGameStore::open(path).await,
        None => {
            warn!("no local store path configured; offline saves are kept in memory only");
            LocalGameStore::in_memory()
        }
    };

    let app_state = AppState::new(config, local);
    spawn_remote_supervisor(&app_state);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    flush_live_rounds(&app_state).await;
    Ok(())
}

/// Start the CouchDB supervisor when a remote store is configured.
#[cfg(feature = "couch-store")]
fn spawn_remote_supervisor(state: &SharedState) {
    use std::sync::Arc;

    use mini_golf_back::{
        dao::{
            game_store::{
                GameStore,
                couchdb::{CouchConfig, CouchDaoError, CouchGameStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let config = match CouchConfig::from_env() {
        Ok(config) => config,
        Err(CouchDaoError::MissingEnvVar { var }) => {
            warn!(var, "remote store not configured; running on the local store only");
            return;
        }
        Err(err) => {
            warn!(error = %err, "invalid remote store configuration; running on the local store only");
            return;
        }
    };

    info!(base_url = %config.base_url, database = %config.database, "using CouchDB remote store");
    tokio::spawn(storage_supervisor::run(state.gateway().clone(), move || {
        let config = config.clone();
        async move {
            CouchGameStore::connect(config)
                .await
                .map(|store| Arc::new(store) as Arc<dyn GameStore>)
                .map_err(StorageError::from)
        }
    }));
}

#[cfg(not(feature = "couch-store"))]
fn spawn_remote_supervisor(_state: &SharedState) {
    warn!("built without a remote store; running on the local store only");
}

/// Save every open round before exiting.
async fn flush_live_rounds(state: &SharedState) {
    let rounds = state
        .rounds()
        .iter()
        .map(|entry| entry.value().clone())
        .collect::<Vec<_>>();

    for round in &rounds {
        round.flush().await;
    }
    if !rounds.is_empty() {
        info!(count = rounds.len(), "saved open rounds before shutdown");
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
