//! Seams to the external RPC transport.

use std::fmt;
use std::sync::Arc;

use scm_api::{
    Handle, ProviderDescriptor, RegisterSourceControl, ScmMainRequest, ScmProviderFeatures,
    SetInputBoxPlaceholder, SetInputBoxValue, UnregisterSourceControl, UpdateSourceControl,
};
use tracing::warn;

use crate::{ScmMain, ScmResult};

/// Name of a contract a transport can hand out proxies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyIdentifier(&'static str);

impl ProxyIdentifier {
    /// Declare a contract name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Contract name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProxyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Host-side SCM contract.
pub const SCM_MAIN: ProxyIdentifier = ProxyIdentifier::new("ScmMain");

/// One ordered, fire-and-forget message channel toward the host.
pub trait RpcChannel: Send + Sync {
    /// Queue `request` for delivery.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the channel cannot accept the message.
    fn send(&self, request: ScmMainRequest) -> ScmResult<()>;
}

/// Factory for contract proxies, supplied by the transport.
pub trait RpcProtocol {
    /// Resolve the channel serving `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScmError::UnknownContract`] when the transport does not
    /// serve the contract.
    fn get_proxy(&self, contract: &ProxyIdentifier) -> ScmResult<Arc<dyn RpcChannel>>;
}

/// Plugin-side stub that turns [`ScmMain`] calls into wire messages.
#[derive(Clone)]
pub struct ScmMainProxy {
    channel: Arc<dyn RpcChannel>,
}

impl ScmMainProxy {
    /// Wrap an already resolved channel.
    #[must_use]
    pub fn new(channel: Arc<dyn RpcChannel>) -> Self {
        Self { channel }
    }

    /// Resolve the [`SCM_MAIN`] channel from `rpc`.
    ///
    /// # Errors
    ///
    /// Propagates the transport's lookup failure.
    pub fn connect(rpc: &dyn RpcProtocol) -> ScmResult<Self> {
        rpc.get_proxy(&SCM_MAIN).map(Self::new)
    }

    fn post(&self, request: ScmMainRequest) {
        let method = request.method();
        let handle = request.handle();
        if let Err(err) = self.channel.send(request) {
            warn!(%handle, method, error = %err, "Dropping SCM message the transport refused");
        }
    }
}

impl fmt::Debug for ScmMainProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmMainProxy").finish_non_exhaustive()
    }
}

impl ScmMain for ScmMainProxy {
    fn register_source_control(&self, handle: Handle, descriptor: ProviderDescriptor) {
        self.post(ScmMainRequest::RegisterSourceControl(RegisterSourceControl {
            handle,
            descriptor,
        }));
    }

    fn update_source_control(&self, handle: Handle, features: ScmProviderFeatures) {
        self.post(ScmMainRequest::UpdateSourceControl(UpdateSourceControl {
            handle,
            features,
        }));
    }

    fn unregister_source_control(&self, handle: Handle) {
        self.post(ScmMainRequest::UnregisterSourceControl(
            UnregisterSourceControl { handle },
        ));
    }

    fn set_input_box_placeholder(&self, handle: Handle, placeholder: String) {
        self.post(ScmMainRequest::SetInputBoxPlaceholder(
            SetInputBoxPlaceholder {
                handle,
                placeholder,
            },
        ));
    }

    fn set_input_box_value(&self, handle: Handle, value: String) {
        self.post(ScmMainRequest::SetInputBoxValue(SetInputBoxValue {
            handle,
            value,
        }));
    }
}

/// Route a decoded request to the matching contract method on `target`.
pub fn dispatch(request: ScmMainRequest, target: &dyn ScmMain) {
    match request {
        ScmMainRequest::RegisterSourceControl(msg) => {
            target.register_source_control(msg.handle, msg.descriptor);
        }
        ScmMainRequest::UpdateSourceControl(msg) => {
            target.update_source_control(msg.handle, msg.features);
        }
        ScmMainRequest::UnregisterSourceControl(msg) => {
            target.unregister_source_control(msg.handle);
        }
        ScmMainRequest::SetInputBoxPlaceholder(msg) => {
            target.set_input_box_placeholder(msg.handle, msg.placeholder);
        }
        ScmMainRequest::SetInputBoxValue(msg) => {
            target.set_input_box_value(msg.handle, msg.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use scm_api::FeatureValue;

    use super::*;
    use crate::ScmError;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<ScmMainRequest>>,
    }

    impl RpcChannel for RecordingChannel {
        fn send(&self, request: ScmMainRequest) -> ScmResult<()> {
            self.sent.lock().expect("sent lock").push(request);
            Ok(())
        }
    }

    struct ClosedChannel;

    impl RpcChannel for ClosedChannel {
        fn send(&self, _request: ScmMainRequest) -> ScmResult<()> {
            Err(ScmError::transport("channel closed"))
        }
    }

    #[derive(Default)]
    struct RecordingMain {
        calls: Mutex<Vec<String>>,
    }

    impl ScmMain for RecordingMain {
        fn register_source_control(&self, handle: Handle, descriptor: ProviderDescriptor) {
            self.record(format!("register {handle} {}", descriptor.id));
        }

        fn update_source_control(&self, handle: Handle, features: ScmProviderFeatures) {
            self.record(format!("update {handle} {:?}", features.count));
        }

        fn unregister_source_control(&self, handle: Handle) {
            self.record(format!("unregister {handle}"));
        }

        fn set_input_box_placeholder(&self, handle: Handle, placeholder: String) {
            self.record(format!("placeholder {handle} {placeholder}"));
        }

        fn set_input_box_value(&self, handle: Handle, value: String) {
            self.record(format!("value {handle} {value}"));
        }
    }

    impl RecordingMain {
        fn record(&self, call: String) {
            self.calls.lock().expect("calls lock").push(call);
        }
    }

    #[test]
    fn proxy_posts_wire_messages_in_call_order() {
        let channel = Arc::new(RecordingChannel::default());
        let proxy = ScmMainProxy::new(channel.clone());

        proxy.register_source_control(Handle::new(1), ProviderDescriptor::new("git", "Git", None));
        proxy.set_input_box_value(Handle::new(1), "msg".into());
        proxy.unregister_source_control(Handle::new(1));

        let methods: Vec<&str> = channel
            .sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(ScmMainRequest::method)
            .collect();
        assert_eq!(
            methods,
            vec![
                "$registerSourceControl",
                "$setInputBoxValue",
                "$unregisterSourceControl"
            ]
        );
    }

    #[test]
    fn refused_sends_are_swallowed() {
        let proxy = ScmMainProxy::new(Arc::new(ClosedChannel));
        proxy.unregister_source_control(Handle::new(9));
    }

    #[test]
    fn dispatch_routes_each_method() {
        let main = RecordingMain::default();
        let handle = Handle::new(3);
        let requests = vec![
            ScmMainRequest::RegisterSourceControl(RegisterSourceControl {
                handle,
                descriptor: ProviderDescriptor::new("git", "Git", None),
            }),
            ScmMainRequest::UpdateSourceControl(UpdateSourceControl {
                handle,
                features: ScmProviderFeatures {
                    count: FeatureValue::Set(2),
                    ..ScmProviderFeatures::new()
                },
            }),
            ScmMainRequest::SetInputBoxPlaceholder(SetInputBoxPlaceholder {
                handle,
                placeholder: "Message".into(),
            }),
            ScmMainRequest::SetInputBoxValue(SetInputBoxValue {
                handle,
                value: "fix".into(),
            }),
            ScmMainRequest::UnregisterSourceControl(UnregisterSourceControl { handle }),
        ];
        for request in requests {
            dispatch(request, &main);
        }

        let calls = main.calls.lock().expect("calls lock");
        assert_eq!(
            *calls,
            vec![
                "register 3 git".to_string(),
                "update 3 Set(2)".to_string(),
                "placeholder 3 Message".to_string(),
                "value 3 fix".to_string(),
                "unregister 3".to_string(),
            ]
        );
    }
}
