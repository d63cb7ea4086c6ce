mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchRoomStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
