//! Batch types for grouping requests.
//!
//! A batch is the set of requests submitted together. It has no state of its own:
//! its status is derived from its members every time it is asked for.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::mapping::{RequestState, RequestType};
use crate::domain::request::{Request, RequestId};
use crate::error::Result;

/// Unique identifier for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl From<Uuid> for BatchId {
    fn from(uuid: Uuid) -> Self {
        BatchId(uuid)
    }
}

impl std::ops::Deref for BatchId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// User who submitted a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Requests created together, in creation order.
#[derive(Debug, Clone)]
pub struct Batch {
    id: BatchId,
    annotations: Option<Value>,
    user: Option<User>,
    requests: Vec<Request>,
}

impl Batch {
    pub fn new() -> Self {
        Self {
            id: BatchId::from(Uuid::new_v4()),
            annotations: None,
            user: None,
            requests: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    /// Free-form JSON the submitter attached to the batch.
    pub fn annotations(&self) -> Option<&Value> {
        self.annotations.as_ref()
    }

    /// Create a member request of `request_type`.
    pub fn create_request(&mut self, request_type: RequestType) -> &mut Request {
        let request = Request::new(self.id, request_type);
        tracing::debug!(
            batch_id = %self.id,
            request_id = %request.id(),
            request_type = %request_type,
            "Created request"
        );
        self.requests.push(request);
        let last = self.requests.len() - 1;
        &mut self.requests[last]
    }

    /// Create a member request from an untrusted numeric type code.
    ///
    /// Nothing is added to the batch if the code is invalid.
    pub fn create_request_from_value(&mut self, request_type: &Value) -> Result<&mut Request> {
        let request_type = RequestType::from_value(request_type)?;
        Ok(self.create_request(request_type))
    }

    /// Member requests in creation order.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.iter().find(|r| r.id() == id)
    }

    pub fn request_mut(&mut self, id: RequestId) -> Option<&mut Request> {
        self.requests.iter_mut().find(|r| r.id() == id)
    }

    /// Current state of each member, in creation order.
    pub fn request_states(&self) -> Vec<RequestState> {
        self.requests.iter().map(Request::effective_state).collect()
    }

    /// Aggregate state of the batch. See [`aggregate_state`].
    pub fn state(&self) -> RequestState {
        aggregate_state(self.requests.iter().map(Request::effective_state))
    }

    /// Snapshot of the derived batch status.
    pub fn status(&self) -> BatchStatus {
        let request_states = self.request_states();
        BatchStatus {
            batch_id: self.id,
            state: aggregate_state(request_states.iter().copied()),
            total_requests: request_states.len(),
            request_states,
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold member states into one batch state.
///
/// Any `in_progress` member makes the batch `in_progress`; otherwise any `failed`
/// member makes it `failed`; otherwise it is `complete`. A batch with no members is
/// `complete`.
pub fn aggregate_state(states: impl IntoIterator<Item = RequestState>) -> RequestState {
    let mut any_failed = false;
    for state in states {
        match state {
            RequestState::InProgress => return RequestState::InProgress,
            RequestState::Failed => any_failed = true,
            RequestState::Complete => {}
        }
    }
    if any_failed {
        RequestState::Failed
    } else {
        RequestState::Complete
    }
}

/// Status information for a batch, computed from its requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    pub batch_id: BatchId,
    pub state: RequestState,
    pub request_states: Vec<RequestState>,
    pub total_requests: usize,
}

impl BatchStatus {
    /// Check if the batch has finished (all requests in terminal state).
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check if the batch is still running.
    pub fn is_running(&self) -> bool {
        !self.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test_log::test]
    fn batch_state_follows_last_request() {
        for last in ["in_progress", "failed", "complete"] {
            let mut batch = Batch::new();
            for _ in 0..3 {
                batch
                    .create_request(RequestType::Add)
                    .add_state("complete", "Some reason")
                    .unwrap();
            }
            batch
                .create_request(RequestType::Add)
                .add_state(last, "Some reason")
                .unwrap();

            assert_eq!(batch.state().to_string(), last);
        }
    }

    #[test_log::test]
    fn request_states_keep_creation_order() {
        let mut batch = Batch::new();
        for state in ["in_progress", "failed", "complete"] {
            batch
                .create_request(RequestType::Add)
                .add_state(state, "Some state")
                .unwrap();
        }

        assert_eq!(
            batch.request_states(),
            vec![
                RequestState::InProgress,
                RequestState::Failed,
                RequestState::Complete
            ]
        );
        assert_eq!(
            serde_json::to_value(batch.status().request_states).unwrap(),
            json!(["in_progress", "failed", "complete"])
        );
    }

    #[test]
    fn in_progress_outranks_failed() {
        assert_eq!(
            aggregate_state([RequestState::Failed, RequestState::InProgress]),
            RequestState::InProgress
        );
        assert_eq!(
            aggregate_state([RequestState::Complete, RequestState::Failed]),
            RequestState::Failed
        );
        assert_eq!(
            aggregate_state(Vec::<RequestState>::new()),
            RequestState::Complete
        );
    }

    #[test_log::test]
    fn request_without_history_counts_as_in_progress() {
        let mut batch = Batch::new();
        batch
            .create_request(RequestType::Rm)
            .add_state("complete", "done")
            .unwrap();
        batch.create_request(RequestType::Rm);

        assert_eq!(batch.state(), RequestState::InProgress);
        assert!(batch.status().is_running());
    }

    #[test_log::test]
    fn state_is_recomputed_after_member_changes() {
        let mut batch = Batch::new();
        let id = batch.create_request(RequestType::Generic).id();
        assert_eq!(batch.state(), RequestState::InProgress);

        batch.request_mut(id).unwrap().add_state("failed", "boom").unwrap();
        let status = batch.status();
        assert_eq!(status.state, RequestState::Failed);
        assert_eq!(status.total_requests, 1);
        assert!(status.is_finished());
    }

    #[test_log::test]
    fn invalid_type_code_adds_nothing() {
        let mut batch = Batch::new();
        let err = batch.create_request_from_value(&json!("1")).unwrap_err();
        assert_eq!(err.to_string(), "1 is not a valid request type number");
        assert!(batch.requests().is_empty());

        let request = batch.create_request_from_value(&json!(2)).unwrap();
        assert_eq!(request.request_type(), RequestType::Rm);
        assert_eq!(batch.requests().len(), 1);
    }

    #[test]
    fn members_reference_their_batch_and_user() {
        let mut batch = Batch::new().with_user(User::new("han_solo@SW.COM"));
        let request_id = batch.create_request(RequestType::Add).id();
        let request = batch.request(request_id).unwrap();

        assert_eq!(request.batch_id(), batch.id());
        assert_eq!(batch.user().unwrap().username, "han_solo@SW.COM");

        batch.set_user(Some(User::new("yoda@SW.COM")));
        assert_eq!(batch.user().unwrap().username, "yoda@SW.COM");
    }
}
