use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer token addressing one source control provider across the process boundary.
///
/// Handles are only meaningful within a single plugin/host connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw integer carried on the wire.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Handle::new(7)).expect("serialize handle");
        assert_eq!(json, "7");

        let decoded: Handle = serde_json::from_str("12").expect("deserialize handle");
        assert_eq!(decoded.get(), 12);
    }
}
