//! Object store abstraction
//!
//! The upload engine only needs one capability from the remote side: store
//! an object at a key. [`ObjectStore`] captures that; [`S3Store`] backs it
//! with `aws-sdk-s3` and [`MemoryStore`] keeps objects in process for dry
//! runs and tests.

pub mod memory;
pub mod s3;

pub use memory::{MemoryStore, StoredObject};
pub use s3::{S3Settings, S3Store};

use crate::error::StoreError;
use async_trait::async_trait;

/// Acknowledgement returned by a successful put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutAck {
    /// Entity tag assigned by the store, when it reports one
    pub e_tag: Option<String>,
}

/// Remote storage capable of accepting whole objects
///
/// Implementations are shared read-only across all upload workers, so any
/// connection pooling or bookkeeping must be internally synchronized.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` at `key` with the given content type and length
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        length: u64,
    ) -> Result<PutAck, StoreError>;

    /// Short human readable description (e.g. `s3://bucket`)
    fn describe(&self) -> String;
}
