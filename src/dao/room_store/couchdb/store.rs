use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::dao::{
    models::RoomDocument,
    room_store::{RoomStore, RoomSubscription},
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchRoomDocument, RevisionOnly, room_doc_id},
};

const MAX_CONFLICT_RETRIES: u32 = 3;

enum PutOutcome {
    Stored,
    Conflict,
}

#[derive(Clone)]
pub struct CouchRoomStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    poll_interval: Duration,
}

impl CouchRoomStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
            poll_interval: config.poll_interval,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorized(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Stored),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Replace the room document, picking up the latest revision so the last writer wins.
    async fn write_room(
        &self,
        code: &str,
        document: RoomDocument,
        must_exist: bool,
    ) -> StorageResult<()> {
        let doc_id = room_doc_id(code);
        let mut doc = CouchRoomDocument::new(code, document, None);

        for attempt in 1..=MAX_CONFLICT_RETRIES {
            let existing = self.get_document::<RevisionOnly>(&doc_id).await?;
            if must_exist && existing.is_none() {
                return Err(StorageError::missing(code));
            }
            doc.rev = existing.map(|found| found.rev);

            match self.put_document(&doc_id, &doc).await? {
                PutOutcome::Stored => return Ok(()),
                PutOutcome::Conflict => {
                    debug!(doc_id = %doc_id, attempt, "revision conflict while writing room");
                }
            }
        }

        Err(CouchDaoError::RevisionConflict {
            path: doc_id,
            attempts: MAX_CONFLICT_RETRIES,
        }
        .into())
    }

    async fn current_rev(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<RevisionOnly>(doc_id)
            .await?
            .map(|found| found.rev))
    }
}

impl RoomStore for CouchRoomStore {
    fn fetch_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>> {
        let store = self.clone();
        let doc_id = room_doc_id(code);
        Box::pin(async move {
            let maybe_doc = store.get_document::<CouchRoomDocument>(&doc_id).await?;
            Ok(maybe_doc.map(|doc| doc.body))
        })
    }

    fn subscribe(&self, code: &str) -> BoxFuture<'static, StorageResult<RoomSubscription>> {
        let store = self.clone();
        let doc_id = room_doc_id(code);
        Box::pin(async move {
            // Only revisions written after this point are delivered.
            let mut last_rev = store.current_rev(&doc_id).await?;
            let (tx, subscription) = RoomSubscription::channel();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(store.poll_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        _ = ticker.tick() => {}
                    }

                    let doc = match store.get_document::<CouchRoomDocument>(&doc_id).await {
                        Ok(Some(doc)) => doc,
                        Ok(None) => continue,
                        Err(err) => {
                            warn!(doc_id = %doc_id, error = %err, "failed to poll room document");
                            continue;
                        }
                    };
                    if doc.rev.is_none() || doc.rev == last_rev {
                        continue;
                    }
                    last_rev = doc.rev;
                    if tx.send(doc.body).await.is_err() {
                        break;
                    }
                }
                debug!(doc_id = %doc_id, "couch room subscription closed");
            });

            Ok(subscription)
        })
    }

    fn upsert_room(
        &self,
        code: &str,
        document: RoomDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let code = code.to_string();
        Box::pin(async move { store.write_room(&code, document, false).await })
    }

    fn update_room(
        &self,
        code: &str,
        document: RoomDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let code = code.to_string();
        Box::pin(async move { store.write_room(&code, document, true).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorized(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
