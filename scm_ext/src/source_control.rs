use std::fmt;
use std::sync::Arc;

use scm_api::{Command, Handle, ProviderDescriptor};
use scm_plugin_api::{ScmError, ScmMain, ScmResult};
use tracing::{debug, trace};
use url::Url;

use crate::{FeatureDelta, InputBox, LocalFeatures, QuickDiffProvider, ScmExtConfig};

/// Group of resources shown under a source control. Not supported by the bridge yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceControlResourceGroup {
    /// Group identifier.
    pub id: String,
    /// Human-friendly label.
    pub label: String,
}

/// Plugin-side handle of one source control provider.
///
/// Creating it registers the provider with the host. Dropping it (or calling
/// [`SourceControl::dispose`]) unregisters it.
pub struct SourceControl {
    handle: Handle,
    id: String,
    label: String,
    root_uri: Option<Url>,
    proxy: Arc<dyn ScmMain>,
    input_box: InputBox,
    features: LocalFeatures,
    disposed: bool,
}

impl SourceControl {
    pub(crate) fn new(
        proxy: Arc<dyn ScmMain>,
        handle: Handle,
        id: &str,
        label: &str,
        root_uri: Option<&Url>,
        config: &ScmExtConfig,
    ) -> Self {
        let root_path = root_uri.map(|uri| uri.path().to_owned());
        let descriptor = ProviderDescriptor::new(id, label, root_path);
        proxy.register_source_control(handle, descriptor);
        debug!(%handle, id, "Registered source control");

        Self {
            handle,
            id: id.to_owned(),
            label: label.to_owned(),
            root_uri: root_uri.cloned(),
            input_box: InputBox::new(Arc::clone(&proxy), handle),
            proxy,
            features: LocalFeatures::new(config),
            disposed: false,
        }
    }

    /// Handle shared with the host.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.handle
    }

    /// Provider identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-friendly label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Repository root, if any.
    #[must_use]
    pub const fn root_uri(&self) -> Option<&Url> {
        self.root_uri.as_ref()
    }

    /// Commit message box.
    #[must_use]
    pub const fn input_box(&self) -> &InputBox {
        &self.input_box
    }

    /// Mutable commit message box.
    pub fn input_box_mut(&mut self) -> &mut InputBox {
        &mut self.input_box
    }

    /// Local feature cache.
    #[must_use]
    pub const fn features(&self) -> &LocalFeatures {
        &self.features
    }

    /// Badge count.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.features.count()
    }

    /// Quick diff provider.
    #[must_use]
    pub const fn quick_diff_provider(&self) -> Option<&Arc<dyn QuickDiffProvider>> {
        self.features.quick_diff_provider()
    }

    /// Commit message template.
    #[must_use]
    pub fn commit_template(&self) -> Option<&str> {
        self.features.commit_template()
    }

    /// Command run when the input box is accepted.
    #[must_use]
    pub const fn accept_input_command(&self) -> Option<&Command> {
        self.features.accept_input_command()
    }

    /// Status bar commands in display order.
    #[must_use]
    pub fn status_bar_commands(&self) -> Option<&[Command]> {
        self.features.status_bar_commands()
    }

    /// Whether [`SourceControl::dispose`] already ran.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Record `delta` locally, then push the resulting update to the host.
    ///
    /// Returns whether a message was sent; see [`LocalFeatures::apply`] for
    /// which writes reach the host.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::Disposed`] once the source control is disposed.
    pub fn update_feature(&mut self, delta: FeatureDelta) -> ScmResult<bool> {
        if self.disposed {
            return Err(ScmError::Disposed {
                handle: self.handle,
            });
        }
        let feature = delta.name();
        match self.features.apply(delta) {
            Some(update) => {
                self.proxy.update_source_control(self.handle, update);
                trace!(handle = %self.handle, feature, "Sent feature update");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Set the badge count.
    ///
    /// # Errors
    ///
    /// See [`SourceControl::update_feature`].
    pub fn set_count(&mut self, count: Option<u32>) -> ScmResult<bool> {
        self.update_feature(FeatureDelta::Count(count))
    }

    /// Set the quick diff provider.
    ///
    /// # Errors
    ///
    /// See [`SourceControl::update_feature`].
    pub fn set_quick_diff_provider(
        &mut self,
        provider: Option<Arc<dyn QuickDiffProvider>>,
    ) -> ScmResult<bool> {
        self.update_feature(FeatureDelta::QuickDiffProvider(provider))
    }

    /// Set the commit message template.
    ///
    /// # Errors
    ///
    /// See [`SourceControl::update_feature`].
    pub fn set_commit_template(&mut self, template: Option<String>) -> ScmResult<bool> {
        self.update_feature(FeatureDelta::CommitTemplate(template))
    }

    /// Set the accept-input command.
    ///
    /// # Errors
    ///
    /// See [`SourceControl::update_feature`].
    pub fn set_accept_input_command(&mut self, command: Option<Command>) -> ScmResult<bool> {
        self.update_feature(FeatureDelta::AcceptInputCommand(command))
    }

    /// Set the status bar commands.
    ///
    /// # Errors
    ///
    /// See [`SourceControl::update_feature`].
    pub fn set_status_bar_commands(&mut self, commands: Option<Vec<Command>>) -> ScmResult<bool> {
        self.update_feature(FeatureDelta::StatusBarCommands(commands))
    }

    /// Create a resource group under this source control.
    ///
    /// # Errors
    ///
    /// Always returns [`ScmError::NotImplemented`].
    pub fn create_resource_group(
        &self,
        _id: &str,
        _label: &str,
    ) -> ScmResult<SourceControlResourceGroup> {
        Err(ScmError::NotImplemented {
            operation: "createResourceGroup",
        })
    }

    /// Unregister from the host. Returns `true` only for the first call.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.proxy.unregister_source_control(self.handle);
        debug!(handle = %self.handle, id = %self.id, "Unregistered source control");
        true
    }
}

impl Drop for SourceControl {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SourceControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceControl")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("label", &self.label)
            .field("root_uri", &self.root_uri)
            .field("features", &self.features)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
