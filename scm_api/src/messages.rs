//! Host-bound messages of the SCM contract.
//!
//! Every message is encoded as `{"method": "$name", "params": {...}}` and is
//! delivered fire-and-forget, in send order, on one channel.

use serde::{Deserialize, Serialize};

use crate::{Handle, ProviderDescriptor, ScmProviderFeatures};

/// A provider announced itself under a fresh handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSourceControl {
    /// Handle chosen by the plugin side.
    pub handle: Handle,
    /// Provider identity.
    #[serde(flatten)]
    pub descriptor: ProviderDescriptor,
}

/// Feature changes for a registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSourceControl {
    /// Target provider handle.
    pub handle: Handle,
    /// Fields that changed.
    pub features: ScmProviderFeatures,
}

/// A provider went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisterSourceControl {
    /// Target provider handle.
    pub handle: Handle,
}

/// New placeholder for a provider's input box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInputBoxPlaceholder {
    /// Owning provider handle.
    pub handle: Handle,
    /// Placeholder text.
    pub placeholder: String,
}

/// New value for a provider's input box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInputBoxValue {
    /// Owning provider handle.
    pub handle: Handle,
    /// Input text.
    pub value: String,
}

/// Envelope for every message the plugin side sends to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ScmMainRequest {
    /// See [`RegisterSourceControl`].
    #[serde(rename = "$registerSourceControl")]
    RegisterSourceControl(RegisterSourceControl),
    /// See [`UpdateSourceControl`].
    #[serde(rename = "$updateSourceControl")]
    UpdateSourceControl(UpdateSourceControl),
    /// See [`UnregisterSourceControl`].
    #[serde(rename = "$unregisterSourceControl")]
    UnregisterSourceControl(UnregisterSourceControl),
    /// See [`SetInputBoxPlaceholder`].
    #[serde(rename = "$setInputBoxPlaceholder")]
    SetInputBoxPlaceholder(SetInputBoxPlaceholder),
    /// See [`SetInputBoxValue`].
    #[serde(rename = "$setInputBoxValue")]
    SetInputBoxValue(SetInputBoxValue),
}

impl ScmMainRequest {
    /// Wire method name of the message.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::RegisterSourceControl(_) => "$registerSourceControl",
            Self::UpdateSourceControl(_) => "$updateSourceControl",
            Self::UnregisterSourceControl(_) => "$unregisterSourceControl",
            Self::SetInputBoxPlaceholder(_) => "$setInputBoxPlaceholder",
            Self::SetInputBoxValue(_) => "$setInputBoxValue",
        }
    }

    /// Provider handle the message is addressed to.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        match self {
            Self::RegisterSourceControl(msg) => msg.handle,
            Self::UpdateSourceControl(msg) => msg.handle,
            Self::UnregisterSourceControl(msg) => msg.handle,
            Self::SetInputBoxPlaceholder(msg) => msg.handle,
            Self::SetInputBoxValue(msg) => msg.handle,
        }
    }
}
