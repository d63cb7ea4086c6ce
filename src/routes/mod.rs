use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod events;
pub mod health;
pub mod rooms;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(rooms::router())
        .merge(events::router())
        .merge(docs::router())
        .with_state(state)
}
