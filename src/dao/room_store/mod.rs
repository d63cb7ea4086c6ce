#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::dao::{models::RoomDocument, storage::StorageResult};

/// Capacity of the per-subscriber snapshot queue.
pub(crate) const SUBSCRIPTION_CAPACITY: usize = 32;

/// Shared, versionless room documents keyed by normalized room code.
///
/// Writes always replace the whole document; stores never compute game logic.
pub trait RoomStore: Send + Sync {
    /// Point lookup by normalized code.
    fn fetch_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>>;
    /// Stream every snapshot written under `code` after subscription.
    fn subscribe(&self, code: &str) -> BoxFuture<'static, StorageResult<RoomSubscription>>;
    /// Create or replace the document stored under `code`.
    fn upsert_room(&self, code: &str, document: RoomDocument)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing document; fails with `StorageError::Missing` otherwise.
    fn update_room(&self, code: &str, document: RoomDocument)
    -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Live feed of room snapshots. Dropping it cancels the subscription.
#[derive(Debug)]
pub struct RoomSubscription {
    receiver: mpsc::Receiver<RoomDocument>,
}

impl RoomSubscription {
    /// Create a subscription together with the sender a store feeds.
    pub(crate) fn channel() -> (mpsc::Sender<RoomDocument>, Self) {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        (sender, Self { receiver })
    }

    /// Wait for the next snapshot; `None` once the store closed the feed.
    pub async fn next(&mut self) -> Option<RoomDocument> {
        self.receiver.recv().await
    }
}
