//! Numeric code <-> name tables for request states and request types.
//!
//! Both tables are fixed at compile time. Codes are what the store persists; names are
//! what the API and workers speak. Lookups are pure and never allocate beyond the
//! sorted name listing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IibError, Result};

/// A closed set of variants with a stable numeric code and a stable name.
pub trait EnumeratedMapping: Sized + Copy + 'static {
    /// Every variant, in code order.
    const ALL: &'static [Self];

    fn code(self) -> i64;

    fn name(self) -> &'static str;

    fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.code() == code)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    /// All names, sorted lexicographically.
    fn get_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|v| v.name()).collect();
        names.sort_unstable();
        names
    }
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    InProgress,
    Complete,
    Failed,
}

impl RequestState {
    /// States after which a request may no longer transition.
    pub const fn final_states() -> [RequestState; 2] {
        [RequestState::Complete, RequestState::Failed]
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestState::Complete | RequestState::Failed)
    }
}

impl EnumeratedMapping for RequestState {
    const ALL: &'static [Self] = &[
        RequestState::InProgress,
        RequestState::Complete,
        RequestState::Failed,
    ];

    fn code(self) -> i64 {
        match self {
            RequestState::InProgress => 1,
            RequestState::Complete => 2,
            RequestState::Failed => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            RequestState::InProgress => "in_progress",
            RequestState::Complete => "complete",
            RequestState::Failed => "failed",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RequestState {
    type Err = IibError;

    fn from_str(s: &str) -> Result<Self> {
        RequestState::from_name(s)
            .ok_or_else(|| IibError::validation(format!(r#"The state "{}" is invalid"#, s)))
    }
}

/// Kind of build a request asks for. Selects the request's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Generic,
    Add,
    Rm,
    RegenerateBundle,
    MergeIndexImage,
    CreateEmptyIndex,
    RecursiveRelatedBundles,
}

impl RequestType {
    /// Validate an untrusted type code.
    ///
    /// Only an exact JSON integer naming a known code is accepted; floats, numeric
    /// strings and null are rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        value
            .as_i64()
            .and_then(RequestType::from_code)
            .ok_or_else(|| {
                // Non-string values render as JSON text, so null reads `null`
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                IibError::validation(format!("{} is not a valid request type number", shown))
            })
    }
}

impl EnumeratedMapping for RequestType {
    const ALL: &'static [Self] = &[
        RequestType::Generic,
        RequestType::Add,
        RequestType::Rm,
        RequestType::RegenerateBundle,
        RequestType::MergeIndexImage,
        RequestType::CreateEmptyIndex,
        RequestType::RecursiveRelatedBundles,
    ];

    fn code(self) -> i64 {
        match self {
            RequestType::Generic => 0,
            RequestType::Add => 1,
            RequestType::Rm => 2,
            RequestType::RegenerateBundle => 3,
            RequestType::MergeIndexImage => 4,
            RequestType::CreateEmptyIndex => 5,
            RequestType::RecursiveRelatedBundles => 6,
        }
    }

    fn name(self) -> &'static str {
        match self {
            RequestType::Generic => "generic",
            RequestType::Add => "add",
            RequestType::Rm => "rm",
            RequestType::RegenerateBundle => "regenerate_bundle",
            RequestType::MergeIndexImage => "merge_index_image",
            RequestType::CreateEmptyIndex => "create_empty_index",
            RequestType::RecursiveRelatedBundles => "recursive_related_bundles",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RequestType {
    type Err = IibError;

    fn from_str(s: &str) -> Result<Self> {
        RequestType::from_name(s)
            .ok_or_else(|| IibError::validation(format!(r#"The request type "{}" is invalid"#, s)))
    }
}
