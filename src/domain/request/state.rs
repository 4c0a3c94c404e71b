//! Core request types.
//!
//! A request carries an append-only log of state entries. The last entry is the
//! request's current state; once that entry is terminal the log is sealed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::batch::BatchId;
use crate::domain::collection::{Architecture, BuildTag, OrderedUnique};
use crate::domain::mapping::{EnumeratedMapping, RequestState, RequestType};
use crate::domain::registry_auths::RegistryAuths;
use crate::error::{IibError, Result};

use super::payload::RequestPayload;

/// Unique identifier for a request in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        RequestId(uuid)
    }
}

impl std::ops::Deref for RequestId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One immutable entry of a request's state history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStateEntry {
    state: RequestState,
    state_reason: String,
    created_at: DateTime<Utc>,
}

impl RequestStateEntry {
    /// Build an entry with an explicit timestamp, e.g. when loading history from a store.
    pub fn new(
        state: RequestState,
        state_reason: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            state_reason: state_reason.into(),
            created_at,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn state_reason(&self) -> &str {
        &self.state_reason
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only, time-ordered state history of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateLog {
    entries: Vec<RequestStateEntry>,
}

impl StateLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored entries, oldest first.
    ///
    /// Fails if any entry follows a terminal one.
    pub fn from_entries(entries: Vec<RequestStateEntry>) -> Result<Self> {
        let mut log = Self::new();
        for entry in entries {
            log.push(entry)?;
        }
        Ok(log)
    }

    /// The latest entry, if any.
    pub fn current(&self) -> Option<&RequestStateEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[RequestStateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `entry` unless the log is sealed by a terminal state.
    pub(crate) fn push(&mut self, entry: RequestStateEntry) -> Result<&RequestStateEntry> {
        if let Some(current) = self.current()
            && current.state.is_terminal()
        {
            return Err(IibError::validation(format!(
                "A {} request cannot change states",
                current.state
            )));
        }
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }
}

/// A single tracked index image build.
///
/// The request's type is carried by its payload, so the two can never disagree.
/// History and child collections only grow; see `transitions` for the mutators.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) id: RequestId,
    pub(crate) batch_id: BatchId,
    pub(crate) states: StateLog,
    pub(crate) architectures: OrderedUnique<Architecture>,
    pub(crate) build_tags: OrderedUnique<BuildTag>,
    pub(crate) registry_auths: Option<RegistryAuths>,
    pub(crate) payload: RequestPayload,
}

impl Request {
    /// Create a request of a known type with an empty history.
    pub fn new(batch_id: BatchId, request_type: RequestType) -> Self {
        Self {
            id: RequestId::from(Uuid::new_v4()),
            batch_id,
            states: StateLog::new(),
            architectures: OrderedUnique::new(),
            build_tags: OrderedUnique::new(),
            registry_auths: None,
            payload: RequestPayload::for_type(request_type),
        }
    }

    /// Rebuild a request loaded from a store.
    ///
    /// The request type follows `payload`. Child collections and credentials are
    /// restored afterwards through the regular mutators.
    pub fn from_parts(
        id: RequestId,
        batch_id: BatchId,
        payload: RequestPayload,
        states: StateLog,
    ) -> Self {
        Self {
            id,
            batch_id,
            states,
            architectures: OrderedUnique::new(),
            build_tags: OrderedUnique::new(),
            registry_auths: None,
            payload,
        }
    }

    /// Create a request from an untrusted numeric type code.
    pub fn from_type_value(batch_id: BatchId, request_type: &Value) -> Result<Self> {
        let request_type = RequestType::from_value(request_type)?;
        Ok(Self::new(batch_id, request_type))
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn request_type(&self) -> RequestType {
        self.payload.request_type()
    }

    /// The current state entry, absent until the first transition.
    pub fn state(&self) -> Option<&RequestStateEntry> {
        self.states.current()
    }

    /// Current state, treating a request with no history as `in_progress`.
    pub fn effective_state(&self) -> RequestState {
        self.state()
            .map(RequestStateEntry::state)
            .unwrap_or(RequestState::InProgress)
    }

    /// Full history, oldest first.
    pub fn states(&self) -> &[RequestStateEntry] {
        self.states.entries()
    }

    pub fn state_log(&self) -> &StateLog {
        &self.states
    }

    pub fn architectures(&self) -> &OrderedUnique<Architecture> {
        &self.architectures
    }

    pub fn build_tags(&self) -> &OrderedUnique<BuildTag> {
        &self.build_tags
    }

    pub fn registry_auths(&self) -> Option<&RegistryAuths> {
        self.registry_auths.as_ref()
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    pub fn is_terminal(&self) -> bool {
        self.effective_state().is_terminal()
    }
}
