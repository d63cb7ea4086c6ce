/// OpenAPI documentation generation.
pub mod documentation;
/// Room SSE message generation.
pub mod events;
/// Health check service.
pub mod health_service;
/// Host loop: local reduction, replication and remote snapshot handling.
pub mod room_service;
/// Local session restore.
pub mod session_service;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Room store connection supervisor.
pub mod storage_supervisor;
