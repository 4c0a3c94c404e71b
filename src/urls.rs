//! URL building abstraction for request artifacts.
//!
//! Artifacts that are not kept in a local directory are served by the API layer,
//! which knows its own routes and external hostname. The core only asks it for a URL
//! when serializing a request verbosely.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::request::RequestId;

/// Kind of per-request artifact a URL can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Build logs of any request
    Logs,
    /// Related bundles manifest of a regenerate-bundle request
    RelatedBundles,
    /// Nested bundles manifest of a recursive-related-bundles request
    NestedBundles,
}

impl ArtifactKind {
    /// File name of the artifact inside its local directory.
    pub fn file_name(self, request_id: RequestId) -> String {
        match self {
            ArtifactKind::Logs => format!("{}.log", request_id.0),
            ArtifactKind::RelatedBundles => format!("{}_related_bundles.json", request_id.0),
            ArtifactKind::NestedBundles => {
                format!("{}_recursive_related_bundles.json", request_id.0)
            }
        }
    }
}

/// Trait for turning a request artifact into a fetchable URL.
///
/// # Example
/// ```ignore
/// let url = builder.artifact_url(request.id(), ArtifactKind::Logs)?;
/// ```
pub trait UrlBuilder: Send + Sync {
    fn artifact_url(&self, request_id: RequestId, kind: ArtifactKind) -> Result<String>;
}

/// Builds URLs from a fixed base, e.g. `https://iib.example.com/api/v1`.
#[derive(Debug, Clone)]
pub struct BaseUrlBuilder {
    base: String,
}

impl BaseUrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl UrlBuilder for BaseUrlBuilder {
    fn artifact_url(&self, request_id: RequestId, kind: ArtifactKind) -> Result<String> {
        let suffix = match kind {
            ArtifactKind::Logs => "logs",
            ArtifactKind::RelatedBundles => "related_bundles",
            ArtifactKind::NestedBundles => "nested_bundles",
        };
        Ok(format!("{}/builds/{}/{}", self.base, request_id.0, suffix))
    }
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

/// Record of a call made to the mock URL builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub request_id: RequestId,
    pub kind: ArtifactKind,
}

/// URL builder returning canned URLs and recording every call.
#[derive(Clone, Default)]
pub struct MockUrlBuilder {
    urls: Arc<Mutex<HashMap<ArtifactKind, String>>>,
    fallback: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockUrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `url` for every artifact kind without a specific response.
    pub fn returning(url: &str) -> Self {
        let mock = Self::new();
        *mock.fallback.lock() = Some(url.to_string());
        mock
    }

    /// Return `url` for artifacts of `kind`.
    pub fn set_url(&self, kind: ArtifactKind, url: &str) {
        self.urls.lock().insert(kind, url.to_string());
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl UrlBuilder for MockUrlBuilder {
    fn artifact_url(&self, request_id: RequestId, kind: ArtifactKind) -> Result<String> {
        self.calls.lock().push(MockCall { request_id, kind });

        if let Some(url) = self.urls.lock().get(&kind) {
            return Ok(url.clone());
        }
        self.fallback
            .lock()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No mock URL configured for {:?}", kind).into())
    }
}
