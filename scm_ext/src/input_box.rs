use std::fmt;
use std::sync::Arc;

use scm_api::Handle;
use scm_plugin_api::ScmMain;

/// Commit message box belonging to one source control.
///
/// Every assignment is forwarded to the host immediately.
pub struct InputBox {
    handle: Handle,
    proxy: Arc<dyn ScmMain>,
    value: String,
    placeholder: String,
}

impl InputBox {
    pub(crate) fn new(proxy: Arc<dyn ScmMain>, handle: Handle) -> Self {
        Self {
            handle,
            proxy,
            value: String::new(),
            placeholder: String::new(),
        }
    }

    /// Current text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and forward it to the host.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.proxy
            .set_input_box_value(self.handle, self.value.clone());
    }

    /// Current placeholder.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Replace the placeholder and forward it to the host.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
        self.proxy
            .set_input_box_placeholder(self.handle, self.placeholder.clone());
    }
}

impl fmt::Debug for InputBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBox")
            .field("handle", &self.handle)
            .field("value", &self.value)
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}
