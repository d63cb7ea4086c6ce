use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{room_store::RoomStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the room store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoomStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_room_store(store.clone()).await;
                info!("room store connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                if !watch_health(&state, store.as_ref()).await {
                    warn!("exhausted room store reconnect attempts; staying in degraded mode");
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "room store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store until it stays unreachable after [`MAX_RECONNECT_ATTEMPTS`]; returns false then.
async fn watch_health(state: &SharedState, store: &dyn RoomStore) -> bool {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("room store healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "room store health check failed");
                if !reconnect(state, store).await {
                    return false;
                }
                state.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

async fn reconnect(state: &SharedState, store: &dyn RoomStore) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "room store reconnection succeeded after health check failure");
                return true;
            }
            Err(reconnect_err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %reconnect_err,
                        "room store reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %reconnect_err, "room store reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
