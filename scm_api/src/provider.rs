use serde::{Deserialize, Serialize};

use crate::{FeatureSet, Handle};

/// Identity of a source control provider, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    /// Provider identifier chosen by the plugin (e.g. "git").
    pub id: String,
    /// Human-friendly label.
    pub label: String,
    /// Path of the repository root, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_uri: Option<String>,
}

impl ProviderDescriptor {
    /// Construct a descriptor.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, root_uri: Option<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            root_uri,
        }
    }
}

/// Host-side view of one live registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceControlSummary {
    /// Handle the plugin registered under.
    pub handle: Handle,
    /// Host-assigned provider id.
    pub id: String,
    /// Provider id chosen by the plugin.
    pub context_value: String,
    /// Human-friendly label.
    pub label: String,
    /// Repository root path, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_uri: Option<String>,
    /// Current feature snapshot.
    #[serde(default)]
    pub features: FeatureSet,
}
