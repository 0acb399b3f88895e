use std::fmt;
use std::sync::Arc;

use scm_ext::ScmExtImpl;
use scm_plugin_api::{ScmMain, ScmService};
use tracing::debug;

use crate::{
    BridgeConfig, DefaultScmService, Error, LoopbackProtocol, Result, ScmMainImpl,
};

/// Both halves of the SCM bridge wired together in one process.
pub struct LocalBridge {
    service: Arc<DefaultScmService>,
    host: Arc<ScmMainImpl>,
    ext: ScmExtImpl,
}

impl LocalBridge {
    /// Build a service, a host registrar and a plugin-side entry point that
    /// talk through a [`LoopbackProtocol`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when the plugin side cannot resolve the SCM
    /// contract.
    pub fn connect(config: &BridgeConfig) -> Result<Self> {
        let service = Arc::new(DefaultScmService::new());
        let svc: Arc<dyn ScmService> = service.clone();
        let host = Arc::new(ScmMainImpl::new(svc, config.registrar));
        let target: Arc<dyn ScmMain> = host.clone();
        let transport = LoopbackProtocol::new(target);
        let ext = ScmExtImpl::with_config(&transport, config.ext)
            .map_err(|source| Error::Connect { source })?;
        debug!(registrar = ?config.registrar, ext = ?config.ext, "SCM bridge connected");
        Ok(Self { service, host, ext })
    }

    /// Plugin-side entry point.
    #[must_use]
    pub const fn ext(&self) -> &ScmExtImpl {
        &self.ext
    }

    /// Host registrar.
    #[must_use]
    pub fn host(&self) -> &ScmMainImpl {
        &self.host
    }

    /// Central service the host registers repositories with.
    #[must_use]
    pub fn service(&self) -> &DefaultScmService {
        &self.service
    }
}

impl fmt::Debug for LocalBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBridge")
            .field("host", &self.host)
            .field("ext", &self.ext)
            .finish_non_exhaustive()
    }
}
