use serde::{Deserialize, Serialize};

/// Plugin-side bridge settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmExtConfig {
    /// Send an explicit `null` when the accept-input or status bar commands are
    /// cleared. When `false` the host keeps the last value it saw.
    pub retract_cleared_commands: bool,
}
