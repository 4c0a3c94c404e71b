//! Request aggregate - domain model and state transitions.
//!
//! This module contains the core domain logic for requests:
//! - Request, its state log and immutable state entries
//! - State transition and collection mutators
//! - Per-type payloads
//! - Derived fields and the JSON representation

pub mod json;
pub mod payload;
pub mod state;
pub mod transitions;

// Re-export commonly used types
pub use json::{ArtifactDescriptor, JsonContext};
pub use payload::*;
pub use state::*;
