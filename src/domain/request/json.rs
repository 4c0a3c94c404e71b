//! Derived request fields and the API representation of a request.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::batch::{Batch, BatchId};
use crate::config::CoreConfig;
use crate::domain::collection::{Architecture, BuildTag, OrderedUnique};
use crate::domain::mapping::{RequestState, RequestType};
use crate::error::Result;
use crate::urls::{ArtifactKind, UrlBuilder};

use super::payload::RequestPayload;
use super::state::{Request, RequestId, RequestStateEntry};

/// What `to_json` needs from the surrounding service.
#[derive(Clone, Copy)]
pub struct JsonContext<'a> {
    pub config: &'a CoreConfig,
    pub urls: &'a dyn UrlBuilder,
}

impl<'a> JsonContext<'a> {
    pub fn new(config: &'a CoreConfig, urls: &'a dyn UrlBuilder) -> Self {
        Self { config, urls }
    }
}

/// Where a request artifact can be fetched and until when it is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub url: String,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct StateHistoryItem<'a> {
    state: RequestState,
    state_reason: &'a str,
    updated: DateTime<Utc>,
}

impl<'a> From<&'a RequestStateEntry> for StateHistoryItem<'a> {
    fn from(entry: &'a RequestStateEntry) -> Self {
        Self {
            state: entry.state(),
            state_reason: entry.state_reason(),
            updated: entry.created_at(),
        }
    }
}

#[derive(Serialize)]
struct RequestJson<'a> {
    id: RequestId,
    arch: &'a OrderedUnique<Architecture>,
    batch: BatchId,
    batch_annotations: Option<&'a Value>,
    build_tags: &'a OrderedUnique<BuildTag>,
    request_type: RequestType,
    state: Option<RequestState>,
    state_reason: Option<&'a str>,
    updated: Option<DateTime<Utc>>,
    user: Option<&'a str>,
    #[serde(flatten)]
    payload: &'a RequestPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_history: Option<Vec<StateHistoryItem<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<ArtifactDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    related_bundles: Option<ArtifactDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nested_bundles: Option<ArtifactDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle_replacements: Option<&'a BTreeMap<String, String>>,
}

impl Request {
    /// When temporary data of this request (logs, manifests) may be removed.
    ///
    /// Absent until the request has a state.
    pub fn temporary_data_expiration(&self, config: &CoreConfig) -> Option<DateTime<Utc>> {
        self.state()
            .map(|entry| entry.created_at() + config.retention())
    }

    /// Describe an artifact of this request, or `None` if it is not stored anywhere.
    ///
    /// A configured local directory wins; otherwise the URL builder is asked, provided
    /// artifacts are uploaded to S3.
    pub fn artifact(
        &self,
        kind: ArtifactKind,
        ctx: &JsonContext<'_>,
    ) -> Result<Option<ArtifactDescriptor>> {
        let config = ctx.config;
        let local_dir: Option<&Path> = match kind {
            ArtifactKind::Logs => config.request_logs_dir.as_deref(),
            ArtifactKind::RelatedBundles => config.request_related_bundles_dir.as_deref(),
            ArtifactKind::NestedBundles => config.request_recursive_related_bundles_dir.as_deref(),
        };

        let url = match local_dir {
            Some(dir) => dir.join(kind.file_name(self.id)).display().to_string(),
            None if config.aws_s3_bucket_name.is_some() => {
                ctx.urls.artifact_url(self.id, kind)?
            }
            None => return Ok(None),
        };

        Ok(Some(ArtifactDescriptor {
            url,
            expiration: self.temporary_data_expiration(config),
        }))
    }

    /// API representation of this request.
    ///
    /// `batch` must be the batch owning this request; it supplies the annotations and
    /// the user. Verbose output adds the state history (newest first) and artifact
    /// descriptors.
    pub fn to_json(&self, batch: &Batch, verbose: bool, ctx: &JsonContext<'_>) -> Result<Value> {
        if batch.id() != self.batch_id {
            return Err(anyhow::anyhow!(
                "Request {} does not belong to batch {}",
                self.id,
                batch.id()
            )
            .into());
        }

        let current = self.state();
        let mut json = RequestJson {
            id: self.id,
            arch: &self.architectures,
            batch: self.batch_id,
            batch_annotations: batch.annotations(),
            build_tags: &self.build_tags,
            request_type: self.request_type(),
            state: current.map(RequestStateEntry::state),
            state_reason: current.map(RequestStateEntry::state_reason),
            updated: current.map(RequestStateEntry::created_at),
            user: batch.user().map(|u| u.username.as_str()),
            payload: &self.payload,
            state_history: None,
            logs: None,
            related_bundles: None,
            nested_bundles: None,
            bundle_replacements: None,
        };

        if verbose {
            json.state_history = Some(
                self.states()
                    .iter()
                    .rev()
                    .map(StateHistoryItem::from)
                    .collect(),
            );
            json.logs = self.artifact(ArtifactKind::Logs, ctx)?;
            match self.request_type() {
                RequestType::RegenerateBundle => {
                    json.related_bundles = self.artifact(ArtifactKind::RelatedBundles, ctx)?;
                    json.bundle_replacements = self.payload.bundle_replacements();
                }
                RequestType::RecursiveRelatedBundles => {
                    json.nested_bundles = self.artifact(ArtifactKind::NestedBundles, ctx)?;
                }
                _ => {}
            }
        }

        Ok(serde_json::to_value(&json)?)
    }
}
