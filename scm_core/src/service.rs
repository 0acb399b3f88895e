use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use scm_plugin_api::{
    Emitter, Event, IdAllocator, ScmProvider, ScmRepository, ScmResult, ScmService,
};
use tracing::debug;

#[derive(Default)]
struct Registry {
    repositories: Mutex<BTreeMap<u32, Arc<dyn ScmProvider>>>,
    ids: IdAllocator,
    added: Emitter<String>,
    removed: Emitter<String>,
}

impl Registry {
    fn repositories(&self) -> MutexGuard<'_, BTreeMap<u32, Arc<dyn ScmProvider>>> {
        self.repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory central SCM service.
#[derive(Default)]
pub struct DefaultScmService {
    registry: Arc<Registry>,
}

impl DefaultScmService {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Providers of all live repositories, in registration order.
    #[must_use]
    pub fn repositories(&self) -> Vec<Arc<dyn ScmProvider>> {
        self.registry.repositories().values().cloned().collect()
    }

    /// Number of live repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.repositories().len()
    }

    /// Whether no repository is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.repositories().is_empty()
    }

    /// Fires with the provider id of every newly registered repository.
    #[must_use]
    pub fn on_did_add_repository(&self) -> Event<String> {
        self.registry.added.event()
    }

    /// Fires with the provider id of every disposed repository.
    #[must_use]
    pub fn on_did_remove_repository(&self) -> Event<String> {
        self.registry.removed.event()
    }
}

impl ScmService for DefaultScmService {
    fn register_provider(
        &self,
        provider: Arc<dyn ScmProvider>,
    ) -> ScmResult<Box<dyn ScmRepository>> {
        let key = self.registry.ids.allocate()?;
        let provider_id = provider.id().to_owned();
        self.registry
            .repositories()
            .insert(key, Arc::clone(&provider));
        debug!(repository = key, provider = %provider_id, "Repository added");
        self.registry.added.fire(&provider_id);

        Ok(Box::new(ServiceRepository {
            key,
            provider,
            registry: Arc::downgrade(&self.registry),
            disposed: false,
        }))
    }
}

impl fmt::Debug for DefaultScmService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<String> = self
            .repositories()
            .iter()
            .map(|provider| provider.id().to_owned())
            .collect();
        f.debug_struct("DefaultScmService")
            .field("providers", &providers)
            .finish()
    }
}

/// Registration record handed out by [`DefaultScmService`].
pub struct ServiceRepository {
    key: u32,
    provider: Arc<dyn ScmProvider>,
    registry: Weak<Registry>,
    disposed: bool,
}

impl ServiceRepository {
    /// Whether [`ScmRepository::dispose`] already ran.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl ScmRepository for ServiceRepository {
    fn provider(&self) -> Arc<dyn ScmProvider> {
        Arc::clone(&self.provider)
    }

    fn set_provider(&mut self, provider: Arc<dyn ScmProvider>) {
        if !self.disposed {
            if let Some(registry) = self.registry.upgrade() {
                registry
                    .repositories()
                    .insert(self.key, Arc::clone(&provider));
            }
        }
        self.provider = provider;
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = registry.repositories().remove(&self.key);
        if removed.is_some() {
            let provider_id = self.provider.id().to_owned();
            debug!(repository = self.key, provider = %provider_id, "Repository removed");
            registry.removed.fire(&provider_id);
        }
    }
}

impl fmt::Debug for ServiceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRepository")
            .field("key", &self.key)
            .field("provider", &self.provider.id())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scm_api::{Handle, ProviderDescriptor};

    use super::*;
    use crate::{ScmProviderAdapter, SnapshotPolicy};

    fn provider(id: &str) -> Arc<dyn ScmProvider> {
        Arc::new(ScmProviderAdapter::new(
            Handle::new(0),
            id,
            ProviderDescriptor::new("git", "Git", None),
            SnapshotPolicy::Merge,
        ))
    }

    #[test]
    fn registered_providers_are_listed_until_disposed() {
        let service = DefaultScmService::new();
        let mut first = service.register_provider(provider("scm0")).expect("register");
        let _second = service.register_provider(provider("scm1")).expect("register");

        let ids: Vec<String> = service
            .repositories()
            .iter()
            .map(|provider| provider.id().to_owned())
            .collect();
        assert_eq!(ids, vec!["scm0", "scm1"]);

        first.dispose();
        assert_eq!(service.len(), 1);
        assert_eq!(service.repositories()[0].id(), "scm1");
    }

    #[test]
    fn dispose_is_idempotent_and_fires_once() {
        let service = DefaultScmService::new();
        let removed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&removed);
        let _sub = service.on_did_remove_repository().subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let mut repository = service.register_provider(provider("scm0")).expect("register");
        repository.dispose();
        repository.dispose();

        assert!(service.is_empty());
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn add_event_carries_the_provider_id() {
        let service = DefaultScmService::new();
        let added = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&added);
        let _sub = service
            .on_did_add_repository()
            .subscribe(move |id: &String| sink.lock().expect("sink").push(id.clone()));

        let _repository = service.register_provider(provider("scm7")).expect("register");
        assert_eq!(*added.lock().expect("sink"), vec!["scm7".to_string()]);
    }

    #[test]
    fn set_provider_swaps_the_listed_provider() {
        let service = DefaultScmService::new();
        let mut repository = service.register_provider(provider("scm0")).expect("register");
        repository.set_provider(provider("scm9"));

        assert_eq!(repository.provider().id(), "scm9");
        assert_eq!(service.repositories()[0].id(), "scm9");
    }

    #[test]
    fn repository_outliving_the_service_disposes_quietly() {
        let service = DefaultScmService::new();
        let mut repository = service.register_provider(provider("scm0")).expect("register");
        drop(service);
        repository.dispose();
    }
}
