//! Request aggregate - domain model and state transitions.
//!
//! This module re-exports types from `domain::request` and `domain::mapping`.
//! See those modules for the actual implementations.

pub use crate::domain::collection::{Architecture, BuildTag, NamedRecord, OrderedUnique};
pub use crate::domain::mapping::{EnumeratedMapping, RequestState, RequestType};
pub use crate::domain::registry_auths::{RegistryAuths, validate_registry_auths};
pub use crate::domain::request::*;
