//! Core domain types for index image build requests.
//!
//! This module contains pure domain types with no persistence dependencies:
//! - Code/name mappings for request states and types
//! - Ordered unique child collections (architectures, build tags)
//! - The request aggregate and its state log
//! - Batches and their derived status
//! - Registry credential validation

pub mod batch;
pub mod collection;
pub mod mapping;
pub mod registry_auths;
pub mod request;
