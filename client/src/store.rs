use async_trait::async_trait;
use taskflow_shared::{ListOrder, Record, RecordId};

use crate::error::ClientError;

/// Remote CRUD over one record collection.
///
/// Implementations do not retry. Every failure comes back as an `Err`; an
/// `Ok` with an empty list always means the collection really is empty.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn list_all(&self, order: Option<&ListOrder>) -> Result<Vec<R>, ClientError>;

    async fn get_by_id(&self, id: RecordId) -> Result<R, ClientError>;

    /// Returns the stored record with its assigned id.
    async fn create(&self, draft: &R::Draft) -> Result<R, ClientError>;

    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R, ClientError>;

    async fn delete(&self, id: RecordId) -> Result<bool, ClientError>;

    /// Case-insensitive substring search, OR across `fields` (the record's
    /// default text fields when empty).
    async fn search(&self, query: &str, fields: &[&str]) -> Result<Vec<R>, ClientError>;
}
