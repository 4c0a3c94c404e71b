//! In-process [`Storage`] implementation.
//!
//! Everything lives behind a single lock, so each operation is applied and made
//! visible as one unit. Useful for tests and for embedding without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::batch::{Batch, BatchId, User};
use crate::error::{IibError, Result};
use crate::request::{Request, RequestId, RequestPayload, RequestStateEntry};

use super::Storage;

#[derive(Default)]
struct Inner {
    batches: HashMap<BatchId, Batch>,
    /// Owning batch of every request
    request_batches: HashMap<RequestId, BatchId>,
}

/// Storage keeping all batches in memory.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a request under the write lock.
    fn with_request_mut<T>(
        &self,
        request_id: RequestId,
        f: impl FnOnce(&mut Request) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.inner.write();
        let batch_id = *inner
            .request_batches
            .get(&request_id)
            .ok_or(IibError::RequestNotFound(request_id))?;
        let request = inner
            .batches
            .get_mut(&batch_id)
            .and_then(|batch| batch.request_mut(request_id))
            .ok_or(IibError::RequestNotFound(request_id))?;
        f(request)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    #[tracing::instrument(skip(self, annotations))]
    async fn create_batch(
        &self,
        user: Option<User>,
        annotations: Option<Value>,
    ) -> Result<BatchId> {
        let mut batch = Batch::new();
        batch.set_user(user);
        if let Some(annotations) = annotations {
            batch = batch.with_annotations(annotations);
        }
        let batch_id = batch.id();

        self.inner.write().batches.insert(batch_id, batch);
        tracing::info!(batch_id = %batch_id, "Created batch");
        Ok(batch_id)
    }

    #[tracing::instrument(skip(self, batch_id), fields(batch_id = %batch_id))]
    async fn create_request(&self, batch_id: BatchId, request_type: &Value) -> Result<RequestId> {
        let mut inner = self.inner.write();
        let batch = inner
            .batches
            .get_mut(&batch_id)
            .ok_or(IibError::BatchNotFound(batch_id))?;
        let request_id = batch.create_request_from_value(request_type)?.id();
        inner.request_batches.insert(request_id, batch_id);

        tracing::info!(batch_id = %batch_id, request_id = %request_id, "Created request");
        Ok(request_id)
    }

    #[tracing::instrument(skip(self, request_id), fields(request_id = %request_id))]
    async fn add_architecture(&self, request_id: RequestId, name: &str) -> Result<()> {
        self.with_request_mut(request_id, |request| {
            request.add_architecture(name);
            Ok(())
        })
    }

    #[tracing::instrument(skip(self, request_id), fields(request_id = %request_id))]
    async fn add_build_tag(&self, request_id: RequestId, name: &str) -> Result<()> {
        self.with_request_mut(request_id, |request| {
            request.add_build_tag(name);
            Ok(())
        })
    }

    #[tracing::instrument(skip(self, request_id), fields(request_id = %request_id))]
    async fn add_state(
        &self,
        request_id: RequestId,
        state: &str,
        state_reason: &str,
    ) -> Result<RequestStateEntry> {
        self.with_request_mut(request_id, |request| {
            request.add_state(state, state_reason).cloned()
        })
    }

    #[tracing::instrument(skip(self, request_id, registry_auths), fields(request_id = %request_id))]
    async fn set_registry_auths(
        &self,
        request_id: RequestId,
        registry_auths: Value,
    ) -> Result<()> {
        self.with_request_mut(request_id, |request| {
            request.set_registry_auths(registry_auths)
        })
    }

    #[tracing::instrument(skip(self, request_id, payload), fields(request_id = %request_id))]
    async fn set_payload(&self, request_id: RequestId, payload: RequestPayload) -> Result<()> {
        self.with_request_mut(request_id, |request| request.set_payload(payload))
    }

    async fn get_request(&self, request_id: RequestId) -> Result<Request> {
        let inner = self.inner.read();
        inner
            .request_batches
            .get(&request_id)
            .and_then(|batch_id| inner.batches.get(batch_id))
            .and_then(|batch| batch.request(request_id))
            .cloned()
            .ok_or(IibError::RequestNotFound(request_id))
    }

    async fn get_batch(&self, batch_id: BatchId) -> Result<Batch> {
        self.inner
            .read()
            .batches
            .get(&batch_id)
            .cloned()
            .ok_or(IibError::BatchNotFound(batch_id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::request::{RequestState, RequestType};

    #[test_log::test(tokio::test)]
    async fn create_request_in_unknown_batch_fails() {
        let storage = InMemoryStorage::new();
        let batch_id = BatchId::from(Uuid::new_v4());
        let err = storage.create_request(batch_id, &json!(1)).await.unwrap_err();
        assert!(matches!(err, IibError::BatchNotFound(id) if id == batch_id));
    }

    #[test_log::test(tokio::test)]
    async fn invalid_type_leaves_batch_empty() {
        let storage = InMemoryStorage::new();
        let batch_id = storage.create_batch(None, None).await.unwrap();

        let err = storage
            .create_request(batch_id, &json!(7))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "7 is not a valid request type number");
        assert!(storage.get_batch(batch_id).await.unwrap().requests().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn unknown_request_is_reported() {
        let storage = InMemoryStorage::new();
        let request_id = RequestId::from(Uuid::new_v4());
        let err = storage
            .add_state(request_id, "in_progress", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, IibError::RequestNotFound(_)));
        assert!(storage.get_request(request_id).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn mutations_are_visible_to_readers() {
        let storage = InMemoryStorage::new();
        let batch_id = storage
            .create_batch(Some(User::new("yoda@SW.COM")), Some(json!({"k": "v"})))
            .await
            .unwrap();
        let request_id = storage.create_request(batch_id, &json!(2)).await.unwrap();

        storage.add_architecture(request_id, "amd64").await.unwrap();
        storage.add_architecture(request_id, "amd64").await.unwrap();
        storage.add_build_tag(request_id, "extra").await.unwrap();
        let entry = storage
            .add_state(request_id, "in_progress", "Starting")
            .await
            .unwrap();
        assert_eq!(entry.state(), RequestState::InProgress);

        let request = storage.get_request(request_id).await.unwrap();
        assert_eq!(request.request_type(), RequestType::Rm);
        assert_eq!(request.architectures().names(), vec!["amd64"]);
        assert_eq!(request.build_tags().names(), vec!["extra"]);
        assert_eq!(request.states().len(), 1);

        let batch = storage.get_batch(batch_id).await.unwrap();
        assert_eq!(batch.user().unwrap().username, "yoda@SW.COM");
        assert_eq!(batch.annotations(), Some(&json!({"k": "v"})));
    }

    #[test_log::test(tokio::test)]
    async fn mismatched_payload_is_not_stored() {
        let storage = InMemoryStorage::new();
        let batch_id = storage.create_batch(None, None).await.unwrap();
        let request_id = storage.create_request(batch_id, &json!(1)).await.unwrap();

        let err = storage
            .set_payload(request_id, RequestPayload::for_type(RequestType::Rm))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let request = storage.get_request(request_id).await.unwrap();
        assert_eq!(request.request_type(), RequestType::Add);
    }

    #[test_log::test(tokio::test)]
    async fn snapshots_are_detached_copies() {
        let storage = InMemoryStorage::new();
        let batch_id = storage.create_batch(None, None).await.unwrap();
        let request_id = storage.create_request(batch_id, &json!(0)).await.unwrap();

        let before = storage.get_request(request_id).await.unwrap();
        storage
            .add_state(request_id, "complete", "Done")
            .await
            .unwrap();

        assert!(before.state().is_none());
        let status = storage.get_batch_status(batch_id).await.unwrap();
        assert_eq!(status.state, RequestState::Complete);
    }
}
