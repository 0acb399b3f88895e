//! Plugin-side half of the SCM bridge.
//!
//! Plugin code creates [`SourceControl`] handles through [`ScmExtImpl`]; each
//! handle mirrors its state to the host through the `ScmMain` contract.

mod config;
mod features;
mod input_box;
mod source_control;

use std::fmt;
use std::sync::Arc;

use scm_api::Handle;
use scm_plugin_api::{IdAllocator, RpcProtocol, ScmMain, ScmMainProxy, ScmResult};
use url::Url;

pub use config::ScmExtConfig;
pub use features::{FeatureDelta, LocalFeatures, QuickDiffProvider};
pub use input_box::InputBox;
pub use source_control::{SourceControl, SourceControlResourceGroup};

/// Entry point plugin code uses to create source controls on one connection.
pub struct ScmExtImpl {
    proxy: Arc<dyn ScmMain>,
    handles: IdAllocator,
    config: ScmExtConfig,
}

impl ScmExtImpl {
    /// Connect to the host SCM contract with default settings.
    ///
    /// # Errors
    ///
    /// Fails when the transport does not serve the SCM contract.
    pub fn new(rpc: &dyn RpcProtocol) -> ScmResult<Self> {
        Self::with_config(rpc, ScmExtConfig::default())
    }

    /// Connect to the host SCM contract.
    ///
    /// # Errors
    ///
    /// Fails when the transport does not serve the SCM contract.
    pub fn with_config(rpc: &dyn RpcProtocol, config: ScmExtConfig) -> ScmResult<Self> {
        let proxy = ScmMainProxy::connect(rpc)?;
        Ok(Self::from_proxy(Arc::new(proxy), config))
    }

    /// Build on top of an existing host stub.
    #[must_use]
    pub fn from_proxy(proxy: Arc<dyn ScmMain>, config: ScmExtConfig) -> Self {
        Self {
            proxy,
            handles: IdAllocator::new(),
            config,
        }
    }

    /// Settings in effect for new source controls.
    #[must_use]
    pub const fn config(&self) -> &ScmExtConfig {
        &self.config
    }

    /// Create a source control and register it with the host.
    ///
    /// # Errors
    ///
    /// Returns [`scm_plugin_api::ScmError::HandlesExhausted`] when no fresh
    /// handle is left on this connection.
    pub fn create_source_control(
        &self,
        id: &str,
        label: &str,
        root_uri: Option<&Url>,
    ) -> ScmResult<SourceControl> {
        let handle = Handle::new(self.handles.allocate()?);
        Ok(SourceControl::new(
            Arc::clone(&self.proxy),
            handle,
            id,
            label,
            root_uri,
            &self.config,
        ))
    }
}

impl fmt::Debug for ScmExtImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmExtImpl")
            .field("next_handle", &self.handles.peek())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
