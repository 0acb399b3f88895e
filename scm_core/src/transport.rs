use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use scm_api::ScmMainRequest;
use scm_plugin_api::{
    dispatch, ProxyIdentifier, RpcChannel, RpcProtocol, ScmError, ScmMain, ScmResult, SCM_MAIN,
};
use tracing::{trace, warn};

/// In-process channel that hands messages to a host `ScmMain` in send order.
///
/// Every message is encoded to JSON text and decoded again before dispatch,
/// so both halves only ever see the wire format. Messages sent while another
/// one is being dispatched are queued behind it.
pub struct LoopbackChannel {
    target: Arc<dyn ScmMain>,
    tx: Sender<String>,
    rx: Receiver<String>,
    draining: AtomicBool,
    delivered: AtomicU64,
}

/// Releases the drain flag on every exit, unwinding included.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LoopbackChannel {
    fn new(target: Arc<dyn ScmMain>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            target,
            tx,
            rx,
            draining: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
        }
    }

    /// Number of messages dispatched to the host so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    fn drain(&self) {
        loop {
            if self.draining.swap(true, Ordering::SeqCst) {
                // Whoever holds the flag delivers what we queued.
                return;
            }
            {
                let _guard = DrainGuard(&self.draining);
                loop {
                    match self.rx.try_recv() {
                        Ok(frame) => self.deliver(&frame),
                        Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                    }
                }
            }
            if self.rx.is_empty() {
                return;
            }
        }
    }

    fn deliver(&self, frame: &str) {
        match serde_json::from_str::<ScmMainRequest>(frame) {
            Ok(request) => {
                trace!(
                    method = request.method(),
                    handle = %request.handle(),
                    "Delivering SCM message"
                );
                dispatch(request, self.target.as_ref());
                self.delivered.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => warn!(error = %err, "Dropping undecodable SCM message"),
        }
    }
}

impl RpcChannel for LoopbackChannel {
    fn send(&self, request: ScmMainRequest) -> ScmResult<()> {
        let frame =
            serde_json::to_string(&request).map_err(|err| ScmError::transport(err.to_string()))?;
        self.tx
            .send(frame)
            .map_err(|err| ScmError::transport(err.to_string()))?;
        self.drain();
        Ok(())
    }
}

impl fmt::Debug for LoopbackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackChannel")
            .field("queued", &self.rx.len())
            .field("delivered", &self.delivered())
            .finish_non_exhaustive()
    }
}

/// Transport serving the SCM contract from a host registrar in the same process.
#[derive(Debug, Clone)]
pub struct LoopbackProtocol {
    channel: Arc<LoopbackChannel>,
}

impl LoopbackProtocol {
    /// Route the SCM contract to `target`.
    #[must_use]
    pub fn new(target: Arc<dyn ScmMain>) -> Self {
        Self {
            channel: Arc::new(LoopbackChannel::new(target)),
        }
    }

    /// The single channel behind this transport.
    #[must_use]
    pub fn channel(&self) -> Arc<LoopbackChannel> {
        Arc::clone(&self.channel)
    }
}

impl RpcProtocol for LoopbackProtocol {
    fn get_proxy(&self, contract: &ProxyIdentifier) -> ScmResult<Arc<dyn RpcChannel>> {
        if *contract != SCM_MAIN {
            return Err(ScmError::UnknownContract {
                contract: contract.to_string(),
            });
        }
        let channel: Arc<dyn RpcChannel> = self.channel.clone();
        Ok(channel)
    }
}
