//! Feud Back binary entrypoint wiring the room store, REST routes and SSE streams.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feud_back::{
    config::{AppConfig, StoreKind},
    dao::{
        room_store::{RoomStore, memory::MemoryRoomStore},
        storage::StorageError,
    },
    routes,
    services::{session_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = config.store();
    let app_state = AppState::new(config);

    spawn_storage(app_state.clone(), store)?;
    tokio::spawn(restore_when_ready(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, store = ?store, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the supervisor owning the configured room store.
fn spawn_storage(state: SharedState, kind: StoreKind) -> anyhow::Result<()> {
    match kind {
        StoreKind::Memory => {
            let store = MemoryRoomStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<Arc<dyn RoomStore>, StorageError>(Arc::new(store)) }
            }));
        }
        #[cfg(feature = "couch-store")]
        StoreKind::Couch => {
            use feud_back::dao::room_store::couchdb::{CouchConfig, CouchRoomStore};

            let couch = CouchConfig::from_env()
                .context("reading CouchDB configuration")?
                .with_poll_interval(state.config().couch_poll_interval());
            tokio::spawn(storage_supervisor::run(state, move || {
                let couch = couch.clone();
                async move {
                    let store = CouchRoomStore::connect(couch)
                        .await
                        .map_err(StorageError::from)?;
                    Ok::<Arc<dyn RoomStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        #[cfg(not(feature = "couch-store"))]
        StoreKind::Couch => {
            anyhow::bail!("CouchDB store requested but the `couch-store` feature is disabled");
        }
    }
    Ok(())
}

/// Restore the local session as soon as a room store is available.
async fn restore_when_ready(state: SharedState) {
    let mut degraded = state.degraded_watcher();
    if degraded.wait_for(|degraded| !*degraded).await.is_err() {
        return;
    }
    session_service::restore(&state).await;
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
