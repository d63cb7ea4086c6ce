/// Database model definitions.
pub mod models;
/// Shared room document store (replication boundary).
pub mod room_store;
/// Local session persistence slots.
pub mod session;
/// Storage abstraction layer for database operations.
pub mod storage;
