//! Type-specific request attributes.
//!
//! Every request shares the same base record; what differs per request type lives
//! in a [`RequestPayload`] variant. The variant is chosen from the type code when the
//! request is created and determines [`RequestPayload::request_type`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::mapping::RequestType;

/// Add operator bundles to an index image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddPayload {
    pub binary_image: Option<String>,
    pub from_index: Option<String>,
    pub bundles: Vec<String>,
    pub organization: Option<String>,
    pub distribution_scope: Option<String>,
    pub deprecation_list: Vec<String>,
}

/// Remove operators from an index image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RmPayload {
    pub binary_image: Option<String>,
    pub from_index: Option<String>,
    pub operators: Vec<String>,
    pub distribution_scope: Option<String>,
}

/// Rebuild a bundle image with pinned related images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerateBundlePayload {
    pub from_bundle_image: Option<String>,
    pub bundle_image: Option<String>,
    pub organization: Option<String>,
    /// Bundle pull specs to substitute, only shown in verbose output
    #[serde(skip)]
    pub bundle_replacements: BTreeMap<String, String>,
}

/// Merge the bundles of one index image into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeIndexImagePayload {
    pub binary_image: Option<String>,
    pub source_from_index: Option<String>,
    pub target_index: Option<String>,
    pub deprecation_list: Vec<String>,
    pub distribution_scope: Option<String>,
}

/// Produce an index image with no operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateEmptyIndexPayload {
    pub binary_image: Option<String>,
    pub from_index: Option<String>,
    pub labels: BTreeMap<String, String>,
}

/// Walk a bundle's related bundles recursively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecursiveRelatedBundlesPayload {
    pub parent_bundle_image: Option<String>,
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenericPayload {}

/// Per-type attributes of a request.
///
/// Serializes as the inner struct's fields so it can be flattened into a request's
/// JSON representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    Generic(GenericPayload),
    Add(AddPayload),
    Rm(RmPayload),
    RegenerateBundle(RegenerateBundlePayload),
    MergeIndexImage(MergeIndexImagePayload),
    CreateEmptyIndex(CreateEmptyIndexPayload),
    RecursiveRelatedBundles(RecursiveRelatedBundlesPayload),
}

impl RequestPayload {
    /// Empty payload for a request of `request_type`.
    pub fn for_type(request_type: RequestType) -> Self {
        match request_type {
            RequestType::Generic => RequestPayload::Generic(GenericPayload::default()),
            RequestType::Add => RequestPayload::Add(AddPayload::default()),
            RequestType::Rm => RequestPayload::Rm(RmPayload::default()),
            RequestType::RegenerateBundle => {
                RequestPayload::RegenerateBundle(RegenerateBundlePayload::default())
            }
            RequestType::MergeIndexImage => {
                RequestPayload::MergeIndexImage(MergeIndexImagePayload::default())
            }
            RequestType::CreateEmptyIndex => {
                RequestPayload::CreateEmptyIndex(CreateEmptyIndexPayload::default())
            }
            RequestType::RecursiveRelatedBundles => {
                RequestPayload::RecursiveRelatedBundles(RecursiveRelatedBundlesPayload::default())
            }
        }
    }

    pub fn request_type(&self) -> RequestType {
        match self {
            RequestPayload::Generic(_) => RequestType::Generic,
            RequestPayload::Add(_) => RequestType::Add,
            RequestPayload::Rm(_) => RequestType::Rm,
            RequestPayload::RegenerateBundle(_) => RequestType::RegenerateBundle,
            RequestPayload::MergeIndexImage(_) => RequestType::MergeIndexImage,
            RequestPayload::CreateEmptyIndex(_) => RequestType::CreateEmptyIndex,
            RequestPayload::RecursiveRelatedBundles(_) => RequestType::RecursiveRelatedBundles,
        }
    }

    /// Bundle replacements of a regenerate-bundle request.
    pub fn bundle_replacements(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            RequestPayload::RegenerateBundle(p) => Some(&p.bundle_replacements),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::EnumeratedMapping;

    #[test]
    fn payload_type_matches_requested_type() {
        for ty in RequestType::ALL {
            assert_eq!(RequestPayload::for_type(*ty).request_type(), *ty);
        }
    }

    #[test]
    fn only_regenerate_bundle_has_replacements() {
        let payload = RequestPayload::for_type(RequestType::RegenerateBundle);
        assert_eq!(payload.bundle_replacements(), Some(&BTreeMap::new()));
        assert!(
            RequestPayload::for_type(RequestType::Add)
                .bundle_replacements()
                .is_none()
        );
    }

    #[test]
    fn serializes_inner_fields() {
        let payload = RequestPayload::Rm(RmPayload {
            from_index: Some("quay.io/ns/index:v4.12".to_string()),
            operators: vec!["operator1".to_string()],
            ..Default::default()
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["from_index"], "quay.io/ns/index:v4.12");
        assert_eq!(value["operators"], serde_json::json!(["operator1"]));
        assert!(value.get("bundle_replacements").is_none());
    }
}
