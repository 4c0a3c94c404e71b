//! Persistence boundary for batches and requests.
//!
//! The domain types are plain in-memory values. A `Storage` implementation owns
//! them, assigns identity to new entities and commits every mutation atomically, so
//! readers never see a half-applied change. Validation happens in the domain layer;
//! a failed operation leaves the stored entity untouched.

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, BatchId, BatchStatus, User};
use crate::error::Result;
use crate::request::{Request, RequestId, RequestPayload, RequestStateEntry};

mod memory;

pub use memory::InMemoryStorage;

/// Storage trait for persisting and querying batches and requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create an empty batch.
    async fn create_batch(
        &self,
        user: Option<User>,
        annotations: Option<Value>,
    ) -> Result<BatchId>;

    /// Create a request under `batch_id` from an untrusted numeric type code.
    async fn create_request(&self, batch_id: BatchId, request_type: &Value) -> Result<RequestId>;

    async fn add_architecture(&self, request_id: RequestId, name: &str) -> Result<()>;

    async fn add_build_tag(&self, request_id: RequestId, name: &str) -> Result<()>;

    /// Append a state to a request's history. This is the call workers make.
    async fn add_state(
        &self,
        request_id: RequestId,
        state: &str,
        state_reason: &str,
    ) -> Result<RequestStateEntry>;

    /// Validate and attach registry credentials to a request.
    async fn set_registry_auths(
        &self,
        request_id: RequestId,
        registry_auths: Value,
    ) -> Result<()>;

    /// Replace a request's type-specific attributes. The payload must match the
    /// request's type.
    async fn set_payload(&self, request_id: RequestId, payload: RequestPayload) -> Result<()>;

    /// Get a snapshot of a request.
    async fn get_request(&self, request_id: RequestId) -> Result<Request>;

    /// Get a snapshot of a batch and all of its requests.
    async fn get_batch(&self, batch_id: BatchId) -> Result<Batch>;

    /// Get the derived status of a batch.
    #[tracing::instrument(skip(self, batch_id), fields(batch_id = %batch_id))]
    async fn get_batch_status(&self, batch_id: BatchId) -> Result<BatchStatus> {
        let batch = self.get_batch(batch_id).await?;
        Ok(batch.status())
    }
}
