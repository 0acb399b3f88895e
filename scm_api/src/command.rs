use serde::{Deserialize, Serialize};

/// Generic command contributed by plugin code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Identifier of the command to execute.
    pub id: String,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional hover text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl Command {
    /// Construct a command with just an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            tooltip: None,
        }
    }

    /// Attach a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Placement of a status bar entry. Encoded as an integer on the wire.
///
/// Values this side does not know decode as [`StatusBarAlignment::Other`] and
/// are written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum StatusBarAlignment {
    /// Left-aligned entry (`1`).
    #[default]
    Left,
    /// Right-aligned entry (`2`).
    Right,
    /// Alignment added by a newer peer.
    Other(u8),
}

impl From<StatusBarAlignment> for u8 {
    fn from(alignment: StatusBarAlignment) -> Self {
        match alignment {
            StatusBarAlignment::Left => 1,
            StatusBarAlignment::Right => 2,
            StatusBarAlignment::Other(value) => value,
        }
    }
}

impl From<u8> for StatusBarAlignment {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Left,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

/// Command reference rendered by the host in the SCM status bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBarCommand {
    /// Identifier of the command to execute.
    pub id: String,
    /// Text shown for the entry; empty when the command has no label.
    pub text: String,
    /// Placement of the entry.
    pub alignment: StatusBarAlignment,
}

impl StatusBarCommand {
    /// Derive a left-aligned status bar entry from a plugin command.
    #[must_use]
    pub fn from_command(command: &Command) -> Self {
        Self {
            id: command.id.clone(),
            text: command.label.clone().unwrap_or_default(),
            alignment: StatusBarAlignment::Left,
        }
    }
}

impl From<&Command> for StatusBarCommand {
    fn from(command: &Command) -> Self {
        Self::from_command(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_label_becomes_empty_text() {
        let entry = StatusBarCommand::from_command(&Command::new("git.sync"));
        assert_eq!(entry.id, "git.sync");
        assert_eq!(entry.text, "");
        assert_eq!(entry.alignment, StatusBarAlignment::Left);
    }

    #[test]
    fn label_is_carried_into_text() {
        let entry = StatusBarCommand::from(&Command::new("git.commit").with_label("Commit"));
        assert_eq!(entry.text, "Commit");
    }

    #[test]
    fn alignment_is_an_integer_on_the_wire() {
        let entry = StatusBarCommand {
            id: "git.push".into(),
            text: "Push".into(),
            alignment: StatusBarAlignment::Right,
        };
        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["alignment"], 2);
    }

    #[test]
    fn unknown_alignment_is_kept_instead_of_failing_the_entry() {
        let entry = serde_json::from_str::<StatusBarCommand>(
            r#"{"id": "x", "text": "", "alignment": 9}"#,
        )
        .expect("decode entry");
        assert_eq!(entry.alignment, StatusBarAlignment::Other(9));

        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["alignment"], 9);
    }
}
