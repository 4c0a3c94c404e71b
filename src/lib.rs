//! Request state machine and batch aggregation for index image builds.
//!
//! Index image build requests move through a strict lifecycle recorded in an
//! append-only state log. Requests submitted together form a batch whose status is
//! derived from its members. Architectures and build tags attached to a request are
//! kept unique and ordered, and registry credentials are validated before a request
//! accepts them.
//!
//! Persistence, URL generation and configuration loading belong to the embedding
//! service; see [`manager::Storage`], [`urls::UrlBuilder`] and [`config::CoreConfig`].

pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod manager;
pub mod request;
pub mod urls;

// Re-export commonly used types
pub use batch::*;
pub use config::CoreConfig;
pub use error::{IibError, Result};
pub use manager::{InMemoryStorage, Storage};
pub use request::*;
pub use urls::{ArtifactKind, BaseUrlBuilder, MockUrlBuilder, UrlBuilder};
