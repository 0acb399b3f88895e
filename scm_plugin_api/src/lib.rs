mod events;
mod ids;
mod proxy;
mod types;

use std::sync::Arc;

pub use events::{Emitter, Event, Subscription};
pub use ids::IdAllocator;
pub use proxy::{dispatch, ProxyIdentifier, RpcChannel, RpcProtocol, ScmMainProxy, SCM_MAIN};
pub use types::{ScmError, ScmResult};

use scm_api::{Handle, ProviderDescriptor, ScmProviderFeatures, StatusBarCommand};

/// Host-bound SCM contract. Every call is a fire-and-forget notification.
pub trait ScmMain: Send + Sync {
    /// A provider was created on the plugin side under `handle`.
    fn register_source_control(&self, handle: Handle, descriptor: ProviderDescriptor);

    /// Feature fields of the provider behind `handle` changed.
    fn update_source_control(&self, handle: Handle, features: ScmProviderFeatures);

    /// The provider behind `handle` was disposed.
    fn unregister_source_control(&self, handle: Handle);

    /// The input box placeholder of the provider behind `handle` changed.
    fn set_input_box_placeholder(&self, handle: Handle, placeholder: String);

    /// The input box value of the provider behind `handle` changed.
    fn set_input_box_value(&self, handle: Handle, value: String);
}

/// Host-native source control provider capability contract.
pub trait ScmProvider: Send + Sync {
    /// Host-assigned identifier.
    fn id(&self) -> &str;

    /// Human-friendly label.
    fn label(&self) -> &str;

    /// Repository root path, if any.
    fn root_uri(&self) -> Option<&str>;

    /// Provider identifier chosen by the plugin.
    fn context_value(&self) -> &str;

    /// Current commit message template.
    fn commit_template(&self) -> Option<String>;

    /// Command run when the input box is accepted.
    fn accept_input_command(&self) -> Option<StatusBarCommand>;

    /// Status bar entries in display order.
    fn status_bar_commands(&self) -> Option<Vec<StatusBarCommand>>;

    /// Badge count.
    fn count(&self) -> Option<u32>;

    /// Whether the plugin offers original resources for quick diff.
    fn has_quick_diff_provider(&self) -> bool;

    /// Fires after every feature update.
    fn on_did_change(&self) -> Event<()>;

    /// Fires when resource groups change.
    fn on_did_change_resources(&self) -> Event<()>;

    /// Fires with the new commit template.
    fn on_did_change_commit_template(&self) -> Event<String>;

    /// Fires with the new status bar entries.
    fn on_did_change_status_bar_commands(&self) -> Event<Vec<StatusBarCommand>>;

    /// Resolve the original (pre-change) version of `uri` for quick diff.
    fn original_resource(&self, uri: &str) -> Option<String>;

    /// Release the provider. Returns `true` only for the call that disposed it.
    fn dispose(&self) -> bool;
}

/// Registration record returned by the central SCM service.
pub trait ScmRepository: Send {
    /// Provider backing this repository.
    fn provider(&self) -> Arc<dyn ScmProvider>;

    /// Swap the provider backing this repository.
    fn set_provider(&mut self, provider: Arc<dyn ScmProvider>);

    /// Remove the repository from the service.
    fn dispose(&mut self);
}

/// Central host service that tracks every source control provider.
pub trait ScmService: Send + Sync {
    /// Register `provider` and return the repository that owns the registration.
    ///
    /// # Errors
    ///
    /// Service-defined failures, e.g. when the service is shutting down.
    fn register_provider(&self, provider: Arc<dyn ScmProvider>)
        -> ScmResult<Box<dyn ScmRepository>>;
}
