use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use scm_api::{Handle, ProviderDescriptor, ScmProviderFeatures, SourceControlSummary};
use scm_plugin_api::{IdAllocator, ScmMain, ScmProvider, ScmRepository, ScmService};
use tracing::{debug, info, trace, warn};

use crate::{DuplicateHandlePolicy, Error, RegistrarConfig, Result, ScmProviderAdapter};

/// Outcome of a message addressed to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The handle was live and the message took effect.
    Applied,
    /// No registration exists for the handle; nothing happened.
    UnknownHandle,
}

struct Registration {
    adapter: Arc<ScmProviderAdapter>,
    repository: Box<dyn ScmRepository>,
}

impl Registration {
    fn release(mut self) {
        self.repository.dispose();
        self.adapter.dispose();
    }
}

/// Host-side registrar serving the `ScmMain` contract for one connection.
///
/// Owns the handle-to-repository map; at most one registration is live per
/// handle.
pub struct ScmMainImpl {
    service: Arc<dyn ScmService>,
    config: RegistrarConfig,
    provider_ids: IdAllocator,
    repositories: Mutex<HashMap<Handle, Registration>>,
}

impl ScmMainImpl {
    /// Create a registrar that registers providers with `service`.
    #[must_use]
    pub fn new(service: Arc<dyn ScmService>, config: RegistrarConfig) -> Self {
        Self {
            service,
            config,
            provider_ids: IdAllocator::new(),
            repositories: Mutex::new(HashMap::new()),
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Wrap `descriptor` in a provider adapter, register it with the service,
    /// and store the repository under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandle`] when `handle` is live and duplicates
    /// are rejected, [`Error::Scm`] when the service refuses the provider, and
    /// [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn register(&self, handle: Handle, descriptor: ProviderDescriptor) -> Result<()> {
        let reject = self.config.duplicate_handles == DuplicateHandlePolicy::Reject;
        if reject && self.contains(handle)? {
            return Err(Error::DuplicateHandle { handle });
        }

        let provider_id = self
            .provider_ids
            .allocate()
            .map(|id| format!("scm{id}"))
            .map_err(|source| Error::Scm { handle, source })?;
        let adapter = Arc::new(ScmProviderAdapter::new(
            handle,
            provider_id.as_str(),
            descriptor,
            self.config.snapshot,
        ));
        let provider: Arc<dyn ScmProvider> = adapter.clone();
        let repository = self
            .service
            .register_provider(provider)
            .map_err(|source| Error::Scm { handle, source })?;
        let registration = Registration {
            adapter,
            repository,
        };

        let outcome = match self.lock()?.entry(handle) {
            Entry::Occupied(_) if reject => Err(registration),
            Entry::Occupied(mut slot) => Ok(Some(slot.insert(registration))),
            Entry::Vacant(slot) => {
                slot.insert(registration);
                Ok(None)
            }
        };

        match outcome {
            Ok(displaced) => {
                if let Some(displaced) = displaced {
                    warn!(%handle, "Handle re-registered; disposing the previous repository");
                    displaced.release();
                }
                info!(%handle, provider = %provider_id, "Source control registered");
                Ok(())
            }
            Err(rejected) => {
                rejected.release();
                Err(Error::DuplicateHandle { handle })
            }
        }
    }

    /// Forward a feature update to the adapter registered under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scm`] if the adapter refuses the update and
    /// [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn update(&self, handle: Handle, features: &ScmProviderFeatures) -> Result<Delivery> {
        let adapter = self
            .lock()?
            .get(&handle)
            .map(|registration| Arc::clone(&registration.adapter));
        let Some(adapter) = adapter else {
            self.note_unknown(handle, "update");
            return Ok(Delivery::UnknownHandle);
        };
        adapter
            .update(features)
            .map_err(|source| Error::Scm { handle, source })?;
        Ok(Delivery::Applied)
    }

    /// Dispose the repository registered under `handle` and forget the handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn unregister(&self, handle: Handle) -> Result<Delivery> {
        let removed = self.lock()?.remove(&handle);
        let Some(registration) = removed else {
            self.note_unknown(handle, "unregister");
            return Ok(Delivery::UnknownHandle);
        };
        registration.release();
        info!(%handle, "Source control unregistered");
        Ok(Delivery::Applied)
    }

    /// Dispose every live registration, e.g. when the connection closes.
    /// Returns how many were disposed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn dispose_all(&self) -> Result<usize> {
        let drained: Vec<(Handle, Registration)> = self.lock()?.drain().collect();
        let count = drained.len();
        for (handle, registration) in drained {
            registration.release();
            debug!(%handle, "Source control disposed with its connection");
        }
        Ok(count)
    }

    /// Whether `handle` has a live registration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn contains(&self, handle: Handle) -> Result<bool> {
        Ok(self.lock()?.contains_key(&handle))
    }

    /// Live handles in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn handles(&self) -> Result<Vec<Handle>> {
        let mut handles: Vec<Handle> = self.lock()?.keys().copied().collect();
        handles.sort_unstable();
        Ok(handles)
    }

    /// Adapter registered under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn provider(&self, handle: Handle) -> Result<Option<Arc<ScmProviderAdapter>>> {
        Ok(self
            .lock()?
            .get(&handle)
            .map(|registration| Arc::clone(&registration.adapter)))
    }

    /// Summaries of every live registration, ordered by handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the map lock is poisoned.
    pub fn summaries(&self) -> Result<Vec<SourceControlSummary>> {
        let mut summaries: Vec<SourceControlSummary> = self
            .lock()?
            .iter()
            .map(|(handle, registration)| {
                let adapter = &registration.adapter;
                SourceControlSummary {
                    handle: *handle,
                    id: adapter.id().to_owned(),
                    context_value: adapter.context_value().to_owned(),
                    label: adapter.label().to_owned(),
                    root_uri: adapter.root_uri().map(str::to_owned),
                    features: adapter.features(),
                }
            })
            .collect();
        summaries.sort_by_key(|summary| summary.handle);
        Ok(summaries)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Handle, Registration>>> {
        Ok(self.repositories.lock()?)
    }

    fn note_unknown(&self, handle: Handle, operation: &'static str) {
        if self.config.trace_unknown_handles {
            debug!(%handle, operation, "Ignoring message for unknown source control handle");
        }
    }
}

impl ScmMain for ScmMainImpl {
    fn register_source_control(&self, handle: Handle, descriptor: ProviderDescriptor) {
        if let Err(err) = self.register(handle, descriptor) {
            warn!(%handle, error = %err, "Failed to register source control");
        }
    }

    fn update_source_control(&self, handle: Handle, features: ScmProviderFeatures) {
        if let Err(err) = self.update(handle, &features) {
            warn!(%handle, error = %err, "Failed to update source control");
        }
    }

    fn unregister_source_control(&self, handle: Handle) {
        if let Err(err) = self.unregister(handle) {
            warn!(%handle, error = %err, "Failed to unregister source control");
        }
    }

    fn set_input_box_placeholder(&self, handle: Handle, placeholder: String) {
        trace!(%handle, %placeholder, "Input box placeholder changed");
    }

    fn set_input_box_value(&self, handle: Handle, value: String) {
        trace!(%handle, len = value.len(), "Input box value changed");
    }
}

impl fmt::Debug for ScmMainImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handles = self.handles().unwrap_or_default();
        f.debug_struct("ScmMainImpl")
            .field("config", &self.config)
            .field("handles", &handles)
            .finish_non_exhaustive()
    }
}
