mod error;
mod store;

pub use error::LocalStoreError;
pub use store::LocalGameStore;

use crate::dao::storage::StorageError;

impl From<LocalStoreError> for StorageError {
    fn from(err: LocalStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
