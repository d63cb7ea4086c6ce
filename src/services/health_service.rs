use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_room_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "room store health check failed");
            }
        }
        Err(_) => warn!("room store unavailable (degraded mode)"),
    }

    HealthResponse::from(state.is_degraded())
}
