//! Validation of registry credential maps supplied with a request.
//!
//! The accepted shape is the one container tooling writes to `auth.json`:
//!
//! ```text
//! {"auths": {"registry.example.com": {"auth": "<base64 user:password>"}}}
//! ```

use serde_json::Value;

use crate::error::{IibError, Result};

/// Check that `value` is a well-formed registry credential map.
///
/// Returns without touching the value on success. Every failure is a
/// [`IibError::ValidationError`] naming the first offending part.
pub fn validate_registry_auths(value: &Value) -> Result<()> {
    let top = value
        .as_object()
        .ok_or_else(|| IibError::validation(r#""registry_auths" must be a dict"#))?;

    if top.len() != 1 || !top.contains_key("auths") {
        return Err(IibError::validation(
            r#""registry_auths" must contain single key "auths""#,
        ));
    }

    let auths = match top.get("auths").and_then(Value::as_object) {
        Some(auths) if !auths.is_empty() => auths,
        _ => {
            return Err(IibError::validation(
                r#""registry_auths.auths" must be a non-empty dict"#,
            ));
        }
    };

    for (registry, entry) in auths {
        if !is_auth_entry(entry) {
            return Err(IibError::validation(format!(
                "{} in registry_auths has auth value in incorrect format. \
                 See the API docs for details on the expected format",
                registry
            )));
        }
    }

    Ok(())
}

/// A registry credential map that passed [`validate_registry_auths`].
///
/// `Debug` lists registries only so credentials never reach logs.
#[derive(Clone, PartialEq)]
pub struct RegistryAuths(Value);

impl RegistryAuths {
    pub fn new(value: Value) -> Result<Self> {
        validate_registry_auths(&value)?;
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Registry hostnames, in map order.
    pub fn registries(&self) -> Vec<&str> {
        self.0
            .get("auths")
            .and_then(Value::as_object)
            .map(|auths| auths.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for RegistryAuths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuths")
            .field("registries", &self.registries())
            .finish()
    }
}

/// `{"auth": <scalar>}` and nothing else.
fn is_auth_entry(entry: &Value) -> bool {
    match entry.as_object() {
        Some(fields) if fields.len() == 1 => matches!(
            fields.get("auth"),
            Some(Value::String(_) | Value::Number(_) | Value::Bool(_))
        ),
        _ => false,
    }
}
