//! Batch types for grouping requests.
//!
//! This module re-exports types from `domain::batch`.
//! See that module for the actual implementation.

pub use crate::domain::batch::{Batch, BatchId, BatchStatus, User, aggregate_state};
