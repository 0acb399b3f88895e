use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use scm_api::{
    FeatureSet, FeatureValue, Handle, ProviderDescriptor, ScmProviderFeatures, StatusBarCommand,
};
use scm_plugin_api::{Emitter, Event, ScmError, ScmProvider, ScmResult};
use tracing::trace;

use crate::SnapshotPolicy;

/// The four change streams of one provider, closed together on disposal.
#[derive(Debug, Default)]
pub struct ProviderEvents {
    changed: Emitter<()>,
    resources_changed: Emitter<()>,
    commit_template_changed: Emitter<String>,
    status_bar_commands_changed: Emitter<Vec<StatusBarCommand>>,
}

impl ProviderEvents {
    /// Close every stream and drop all listeners.
    pub fn close(&self) {
        self.changed.close();
        self.resources_changed.close();
        self.commit_template_changed.close();
        self.status_bar_commands_changed.close();
    }

    /// Total number of live listeners across all streams.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.changed.listener_count()
            + self.resources_changed.listener_count()
            + self.commit_template_changed.listener_count()
            + self.status_bar_commands_changed.listener_count()
    }
}

/// Host-native provider backed by updates from a plugin-side source control.
pub struct ScmProviderAdapter {
    handle: Handle,
    id: String,
    descriptor: ProviderDescriptor,
    policy: SnapshotPolicy,
    features: Mutex<FeatureSet>,
    events: ProviderEvents,
    disposed: AtomicBool,
}

impl ScmProviderAdapter {
    /// Build an adapter for the provider registered under `handle`.
    ///
    /// `id` is the host-assigned identifier; the plugin's own id becomes the
    /// context value.
    #[must_use]
    pub fn new(
        handle: Handle,
        id: impl Into<String>,
        descriptor: ProviderDescriptor,
        policy: SnapshotPolicy,
    ) -> Self {
        Self {
            handle,
            id: id.into(),
            descriptor,
            policy,
            features: Mutex::new(FeatureSet::default()),
            events: ProviderEvents::default(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Plugin handle this adapter mirrors.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.handle
    }

    /// Copy of the current feature snapshot.
    #[must_use]
    pub fn features(&self) -> FeatureSet {
        self.snapshot().clone()
    }

    /// Event registry of this provider.
    #[must_use]
    pub const fn events(&self) -> &ProviderEvents {
        &self.events
    }

    /// Whether [`ScmProvider::dispose`] already ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Store `update` and notify listeners.
    ///
    /// The generic change event always fires. The commit template event fires
    /// for a non-empty template carried by the update and the status bar event
    /// for a command list carried by the update. Fields the update leaves out
    /// or clears fire nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::Disposed`] after disposal; nothing is stored or fired.
    pub fn update(&self, update: &ScmProviderFeatures) -> ScmResult<()> {
        if self.is_disposed() {
            return Err(ScmError::Disposed {
                handle: self.handle,
            });
        }
        {
            let mut snapshot = self.snapshot();
            match self.policy {
                SnapshotPolicy::Merge => snapshot.apply(update),
                SnapshotPolicy::Replace => *snapshot = FeatureSet::replace(update),
            }
        }

        let notified = self.events.changed.fire(&());
        trace!(handle = %self.handle, id = %self.id, notified, "Provider features changed");

        if let FeatureValue::Set(template) = &update.commit_template {
            if !template.is_empty() {
                self.events.commit_template_changed.fire(template);
            }
        }
        if let FeatureValue::Set(commands) = &update.status_bar_commands {
            self.events.status_bar_commands_changed.fire(commands);
        }
        Ok(())
    }

    fn snapshot(&self) -> MutexGuard<'_, FeatureSet> {
        self.features.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScmProvider for ScmProviderAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.descriptor.label
    }

    fn root_uri(&self) -> Option<&str> {
        self.descriptor.root_uri.as_deref()
    }

    fn context_value(&self) -> &str {
        &self.descriptor.id
    }

    fn commit_template(&self) -> Option<String> {
        self.snapshot().commit_template.clone()
    }

    fn accept_input_command(&self) -> Option<StatusBarCommand> {
        self.snapshot().accept_input_command.clone()
    }

    fn status_bar_commands(&self) -> Option<Vec<StatusBarCommand>> {
        self.snapshot().status_bar_commands.clone()
    }

    fn count(&self) -> Option<u32> {
        self.snapshot().count
    }

    fn has_quick_diff_provider(&self) -> bool {
        self.snapshot().has_quick_diff_provider.unwrap_or(false)
    }

    fn on_did_change(&self) -> Event<()> {
        self.events.changed.event()
    }

    fn on_did_change_resources(&self) -> Event<()> {
        self.events.resources_changed.event()
    }

    fn on_did_change_commit_template(&self) -> Event<String> {
        self.events.commit_template_changed.event()
    }

    fn on_did_change_status_bar_commands(&self) -> Event<Vec<StatusBarCommand>> {
        self.events.status_bar_commands_changed.event()
    }

    // Original resources would have to be requested from the plugin side,
    // which the bridge has no reverse channel for.
    fn original_resource(&self, _uri: &str) -> Option<String> {
        None
    }

    fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.events.close();
        trace!(handle = %self.handle, id = %self.id, "Provider adapter disposed");
        true
    }
}

impl fmt::Debug for ScmProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmProviderAdapter")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("features", &*self.snapshot())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
