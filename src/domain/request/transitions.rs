//! Mutations of a request.
//!
//! A request only ever grows: state entries are appended to its log and names are
//! added to its child collections. Every mutator validates first and touches nothing
//! on failure.
//!
//! # State machine
//!
//! ```text
//!   (no entries) ──add_state──> in_progress ──add_state──> in_progress
//!        │                          │
//!        │                          ├──add_state──> complete   (terminal)
//!        │                          └──add_state──> failed     (terminal)
//!        └──add_state──> complete | failed
//! ```
//!
//! A request with no entries behaves as `in_progress`. After a terminal entry every
//! further `add_state` fails with `A <state> request cannot change states`.

use chrono::Utc;
use metrics::counter;
use serde_json::Value;

use crate::domain::mapping::{EnumeratedMapping, RequestState};
use crate::domain::registry_auths::RegistryAuths;
use crate::error::{IibError, Result};

use super::payload::RequestPayload;
use super::state::{Request, RequestStateEntry};

impl Request {
    /// Append a state named `state` to this request's history.
    ///
    /// Fails with a validation error if `state` is not a known state name or if the
    /// request is already `complete` or `failed`.
    pub fn add_state(
        &mut self,
        state: &str,
        state_reason: impl Into<String>,
    ) -> Result<&RequestStateEntry> {
        let new_state = match state.parse::<RequestState>() {
            Ok(new_state) => new_state,
            Err(e) => {
                counter!("iib_request_state_rejected_total", "reason" => "unknown_state")
                    .increment(1);
                tracing::warn!(request_id = %self.id, state, "Rejected unknown request state");
                return Err(e);
            }
        };
        self.transition(new_state, state_reason)
    }

    /// Typed form of [`Request::add_state`].
    pub fn transition(
        &mut self,
        state: RequestState,
        state_reason: impl Into<String>,
    ) -> Result<&RequestStateEntry> {
        let request_id = self.id;
        let previous = self.states.current().map(RequestStateEntry::state);
        let entry = RequestStateEntry::new(state, state_reason, Utc::now());

        match self.states.push(entry) {
            Ok(entry) => {
                counter!("iib_request_state_transitions_total", "state" => state.name())
                    .increment(1);
                tracing::debug!(
                    request_id = %request_id,
                    from = previous.map(|s| s.name()),
                    to = state.name(),
                    reason = entry.state_reason(),
                    "Request changed state"
                );
                Ok(entry)
            }
            Err(e) => {
                counter!("iib_request_state_rejected_total", "reason" => "terminal").increment(1);
                tracing::warn!(
                    request_id = %request_id,
                    current = previous.map(|s| s.name()),
                    attempted = state.name(),
                    "Rejected transition out of terminal state"
                );
                Err(e)
            }
        }
    }

    /// Record that the request builds for `name`. Adding a known name is a no-op.
    pub fn add_architecture(&mut self, name: &str) {
        if self.architectures.add(name) {
            tracing::trace!(request_id = %self.id, arch = name, "Added architecture");
        }
    }

    /// Record an extra tag for the built image. Adding a known name is a no-op.
    pub fn add_build_tag(&mut self, name: &str) {
        if self.build_tags.add(name) {
            tracing::trace!(request_id = %self.id, tag = name, "Added build tag");
        }
    }

    /// Replace the type-specific attributes.
    ///
    /// `payload` must be of the request's own type; the type fixed at construction
    /// never changes.
    pub fn set_payload(&mut self, payload: RequestPayload) -> Result<()> {
        let request_type = self.request_type();
        let payload_type = payload.request_type();
        if payload_type != request_type {
            tracing::warn!(
                request_id = %self.id,
                request_type = %request_type,
                payload_type = %payload_type,
                "Rejected payload of another request type"
            );
            return Err(IibError::validation(format!(
                "A request of type {} cannot take a {} payload",
                request_type, payload_type
            )));
        }
        self.payload = payload;
        Ok(())
    }

    /// Edit the type-specific attributes in place.
    ///
    /// Nothing changes if `f` swaps in a payload of another type.
    pub fn update_payload(&mut self, f: impl FnOnce(&mut RequestPayload)) -> Result<()> {
        let mut payload = self.payload.clone();
        f(&mut payload);
        self.set_payload(payload)
    }

    /// Validate and attach registry credentials, replacing any previous ones.
    pub fn set_registry_auths(&mut self, value: Value) -> Result<()> {
        let auths = RegistryAuths::new(value).inspect_err(|e| {
            tracing::warn!(request_id = %self.id, error = %e, "Rejected registry_auths");
        })?;
        tracing::debug!(
            request_id = %self.id,
            registries = ?auths.registries(),
            "Attached registry credentials"
        );
        self.registry_auths = Some(auths);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::batch::BatchId;
    use crate::domain::mapping::RequestType;
    use crate::domain::request::payload::{AddPayload, RmPayload};

    fn minimal_request() -> Request {
        Request::new(BatchId::from(Uuid::new_v4()), RequestType::Generic)
    }

    #[test_log::test]
    fn add_architecture_is_idempotent() {
        let mut request = minimal_request();
        request.add_architecture("amd64");
        request.add_architecture("s390x");

        assert_eq!(request.architectures().len(), 2);
        assert_eq!(request.architectures()[0].name, "amd64");
        assert_eq!(request.architectures()[1].name, "s390x");

        request.add_architecture("amd64");
        assert_eq!(request.architectures().len(), 2);
    }

    #[test_log::test]
    fn add_build_tag_is_idempotent() {
        let mut request = minimal_request();
        request.add_build_tag("build-tag1");
        request.add_build_tag("build-tag1");
        request.add_build_tag("build-tag1");
        request.add_build_tag("build-tag2");

        assert_eq!(request.build_tags().names(), vec!["build-tag1", "build-tag2"]);
    }

    #[test_log::test]
    fn add_state_appends_history() {
        let mut request = minimal_request();
        request.add_state("in_progress", "Starting things up").unwrap();
        request.add_state("complete", "All done!").unwrap();

        assert_eq!(request.states().len(), 2);
        let current = request.state().unwrap();
        assert_eq!(current.state_name(), "complete");
        assert_eq!(current.state_reason(), "All done!");
        assert_eq!(request.states()[0].state_name(), "in_progress");
        assert_eq!(current, &request.states()[1]);
    }

    #[test_log::test]
    fn add_state_rejects_unknown_state() {
        let mut request = minimal_request();
        let err = request.add_state("invalid", "Starting things up").unwrap_err();
        assert_eq!(err.to_string(), r#"The state "invalid" is invalid"#);
        assert!(request.states().is_empty());
    }

    #[test_log::test]
    fn terminal_request_cannot_change_states() {
        for terminal in ["complete", "failed"] {
            let mut request = minimal_request();
            request.add_state(terminal, "Done").unwrap();

            let err = request.add_state("in_progress", "Oops!").unwrap_err();
            assert!(err.is_validation());
            assert_eq!(
                err.to_string(),
                format!("A {} request cannot change states", terminal)
            );
            assert_eq!(request.states().len(), 1);
            assert_eq!(request.state().unwrap().state_name(), terminal);
            assert_eq!(request.state().unwrap().state_reason(), "Done");
        }
    }

    #[test_log::test]
    fn unknown_state_is_reported_before_terminality() {
        let mut request = minimal_request();
        request.add_state("failed", "Broken").unwrap();
        let err = request.add_state("bogus", "x").unwrap_err();
        assert_eq!(err.to_string(), r#"The state "bogus" is invalid"#);
    }

    #[test_log::test]
    fn in_progress_may_repeat() {
        let mut request = minimal_request();
        request.add_state("in_progress", "Building").unwrap();
        request.add_state("in_progress", "Pushing").unwrap();
        assert_eq!(request.states().len(), 2);
        assert_eq!(request.state().unwrap().state_reason(), "Pushing");
    }

    #[test_log::test]
    fn registry_auths_are_validated_before_attaching() {
        let mut request = minimal_request();
        let err = request
            .set_registry_auths(json!({"auths": {"registry": {"authS": "YOLO"}}}))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(request.registry_auths().is_none());

        request
            .set_registry_auths(json!({"auths": {"registry.redhat.io": {"auth": "YOLO"}}}))
            .unwrap();
        assert_eq!(
            request.registry_auths().unwrap().registries(),
            vec!["registry.redhat.io"]
        );
    }

    #[test_log::test]
    fn payload_of_another_type_is_rejected() {
        let mut request = Request::new(BatchId::from(Uuid::new_v4()), RequestType::Add);

        let err = request
            .set_payload(RequestPayload::Rm(RmPayload::default()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "A request of type add cannot take a rm payload");
        assert_eq!(request.request_type(), RequestType::Add);

        let err = request
            .update_payload(|payload| *payload = RequestPayload::Rm(RmPayload::default()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(request.request_type(), RequestType::Add);
        assert_eq!(request.payload(), &RequestPayload::for_type(RequestType::Add));
    }

    #[test_log::test]
    fn payload_of_same_type_is_applied() {
        let mut request = Request::new(BatchId::from(Uuid::new_v4()), RequestType::Add);
        request
            .set_payload(RequestPayload::Add(AddPayload {
                from_index: Some("quay.io/ns/index:v4.12".to_string()),
                ..Default::default()
            }))
            .unwrap();
        request
            .update_payload(|payload| {
                if let RequestPayload::Add(add) = payload {
                    add.bundles.push("quay.io/ns/bundle:1.0".to_string());
                }
            })
            .unwrap();

        let RequestPayload::Add(add) = request.payload() else {
            panic!("expected an add payload");
        };
        assert_eq!(add.from_index.as_deref(), Some("quay.io/ns/index:v4.12"));
        assert_eq!(add.bundles, vec!["quay.io/ns/bundle:1.0"]);
    }
}
