//! In-process room store, used for single-node deployments and tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::{RoomStore, RoomSubscription};
use crate::dao::{
    models::RoomDocument,
    storage::{StorageError, StorageResult},
};

const FANOUT_CAPACITY: usize = 64;

struct RoomEntry {
    document: Option<RoomDocument>,
    fanout: broadcast::Sender<RoomDocument>,
}

impl RoomEntry {
    fn new() -> Self {
        let (fanout, _receiver) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            document: None,
            fanout,
        }
    }
}

/// Room documents held in memory with one broadcast channel per room.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    rooms: Arc<DashMap<String, RoomEntry>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, code: &str, document: RoomDocument, must_exist: bool) -> StorageResult<()> {
        let mut entry = self
            .rooms
            .entry(code.to_string())
            .or_insert_with(RoomEntry::new);
        if must_exist && entry.document.is_none() {
            return Err(StorageError::missing(code));
        }

        entry.document = Some(document.clone());
        // Nobody listening is fine: the document is still stored.
        let _ = entry.fanout.send(document);
        Ok(())
    }
}

impl RoomStore for MemoryRoomStore {
    fn fetch_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>> {
        let found = self
            .rooms
            .get(code)
            .and_then(|entry| entry.document.clone());
        Box::pin(async move { Ok(found) })
    }

    fn subscribe(&self, code: &str) -> BoxFuture<'static, StorageResult<RoomSubscription>> {
        let mut receiver = self
            .rooms
            .entry(code.to_string())
            .or_insert_with(RoomEntry::new)
            .fanout
            .subscribe();
        let code = code.to_string();

        Box::pin(async move {
            let (tx, subscription) = RoomSubscription::channel();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        received = receiver.recv() => match received {
                            Ok(document) => {
                                if tx.send(document).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Closed) => break,
                            Err(RecvError::Lagged(skipped)) => {
                                warn!(code = %code, skipped, "room subscriber lagged; skipping snapshots");
                            }
                        }
                    }
                }
                debug!(code = %code, "memory room subscription closed");
            });
            Ok(subscription)
        })
    }

    fn upsert_room(
        &self,
        code: &str,
        document: RoomDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.write(code, document, false);
        Box::pin(async move { result })
    }

    fn update_room(
        &self,
        code: &str,
        document: RoomDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.write(code, document, true);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::state::{questions::QuestionBank, session};

    fn document(nickname: &str) -> RoomDocument {
        let (_, room) = session::create_room(
            nickname,
            &session::RoomSettings::default(),
            &QuestionBank::builtin(),
        );
        RoomDocument::anonymous(room)
    }

    #[tokio::test]
    async fn upsert_then_fetch() {
        let store = MemoryRoomStore::new();
        assert!(store.fetch_room("DZ-OR").await.unwrap().is_none());

        let doc = document("Host");
        store.upsert_room("DZ-OR", doc.clone()).await.unwrap();
        assert_eq!(store.fetch_room("DZ-OR").await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn update_requires_existing_room() {
        let store = MemoryRoomStore::new();
        let err = store.update_room("DZ-OR", document("Host")).await.unwrap_err();
        assert!(matches!(err, StorageError::Missing { .. }));

        store.upsert_room("DZ-OR", document("Host")).await.unwrap();
        let replacement = document("Other");
        store.update_room("DZ-OR", replacement.clone()).await.unwrap();
        assert_eq!(store.fetch_room("DZ-OR").await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn subscribers_receive_writes_in_order() {
        let store = MemoryRoomStore::new();
        let mut subscription = store.subscribe("DZ-OR").await.unwrap();

        let first = document("First");
        let second = document("Second");
        store.upsert_room("DZ-OR", first.clone()).await.unwrap();
        store.update_room("DZ-OR", second.clone()).await.unwrap();

        let wait = Duration::from_secs(1);
        assert_eq!(timeout(wait, subscription.next()).await.unwrap(), Some(first));
        assert_eq!(timeout(wait, subscription.next()).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn rooms_are_isolated_by_code() {
        let store = MemoryRoomStore::new();
        store.upsert_room("DZ-OR", document("Host")).await.unwrap();
        assert!(store.fetch_room("OTHER").await.unwrap().is_none());
    }
}
