//! Configuration consumed by the core.
//!
//! The core never loads configuration itself; the embedding service deserializes a
//! [`CoreConfig`] from wherever it keeps settings and hands it in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings read when deriving expirations and artifact locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// How many days temporary request data (logs, manifests) is kept after the
    /// request's last state change
    pub request_data_days_to_live: u32,

    /// Local directory holding build logs, named `<request id>.log`
    pub request_logs_dir: Option<PathBuf>,

    /// Local directory holding related bundle manifests of regenerate-bundle requests
    pub request_related_bundles_dir: Option<PathBuf>,

    /// Local directory holding nested bundle manifests of recursive-related-bundles requests
    pub request_recursive_related_bundles_dir: Option<PathBuf>,

    /// S3 bucket artifacts are uploaded to when no local directory is configured
    pub aws_s3_bucket_name: Option<String>,
}

impl CoreConfig {
    /// Retention period for temporary request data.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.request_data_days_to_live))
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            request_data_days_to_live: 3,
            request_logs_dir: None,
            request_related_bundles_dir: None,
            request_recursive_related_bundles_dir: None,
            aws_s3_bucket_name: None,
        }
    }
}
