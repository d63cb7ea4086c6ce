use serde::Serialize;
use utoipa::ToSchema;

/// Whether the room store is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// No room store; rooms cannot be created, joined or replicated.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether a room store is reachable.
    pub status: HealthStatus,
}

impl From<bool> for HealthResponse {
    fn from(degraded: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status }
    }
}
