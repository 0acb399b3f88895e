use camino::Utf8Path;
use scm_ext::ScmExtConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What the registrar does when a plugin registers a handle that is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHandlePolicy {
    /// Last write wins. The displaced repository is disposed.
    #[default]
    Overwrite,
    /// Keep the existing registration and report an error.
    Reject,
}

/// How a provider adapter stores incoming feature updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Each update replaces the whole snapshot.
    #[default]
    Replace,
    /// Fields missing from an update keep their previous value.
    Merge,
}

/// Host registrar settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Handling of re-used handles.
    pub duplicate_handles: DuplicateHandlePolicy,
    /// Storage of feature updates.
    pub snapshot: SnapshotPolicy,
    /// Log messages addressed to unknown handles at debug level.
    pub trace_unknown_handles: bool,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Log subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Settings for both halves of a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host registrar settings.
    pub registrar: RegistrarConfig,
    /// Plugin-side settings.
    pub ext: ScmExtConfig,
    /// Log subscriber settings.
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Parse settings from JSON text. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed input.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it does not parse.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| Error::Config {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = BridgeConfig::from_json_str("{}").expect("parse config");
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.registrar.duplicate_handles, DuplicateHandlePolicy::Overwrite);
        assert_eq!(config.registrar.snapshot, SnapshotPolicy::Replace);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_document_overrides_selected_keys() {
        let config = BridgeConfig::from_json_str(
            r#"{
                "registrar": {"duplicate_handles": "reject", "trace_unknown_handles": true},
                "ext": {"retract_cleared_commands": true},
                "logging": {"format": "json"}
            }"#,
        )
        .expect("parse config");

        assert_eq!(config.registrar.duplicate_handles, DuplicateHandlePolicy::Reject);
        assert!(config.registrar.trace_unknown_handles);
        assert_eq!(config.registrar.snapshot, SnapshotPolicy::Replace);
        assert!(config.ext.retract_cleared_commands);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("bridge.json"))
            .expect("utf-8 temp path");
        std::fs::write(&path, r#"{"registrar": {"snapshot": "merge"}}"#).expect("write config");

        let config = BridgeConfig::from_path(&path).expect("load config");
        assert_eq!(config.registrar.snapshot, SnapshotPolicy::Merge);
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = Utf8PathBuf::from_path_buf(dir.path().join("missing.json"))
            .expect("utf-8 temp path");
        assert!(matches!(
            BridgeConfig::from_path(&missing),
            Err(Error::Io { .. })
        ));

        let malformed = Utf8PathBuf::from_path_buf(dir.path().join("bad.json"))
            .expect("utf-8 temp path");
        std::fs::write(&malformed, "{ registrar: ").expect("write config");
        match BridgeConfig::from_path(&malformed) {
            Err(Error::Config { path, .. }) => assert_eq!(path, malformed.to_string()),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
