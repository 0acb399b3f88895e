use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::StatusBarCommand;

/// Tri-state wire field used by feature updates.
///
/// An absent key decodes to [`FeatureValue::Unchanged`], an explicit `null`
/// to [`FeatureValue::Cleared`], and any other value to [`FeatureValue::Set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureValue<T> {
    /// The sender did not touch this field.
    Unchanged,
    /// The sender explicitly unset this field.
    Cleared,
    /// The field holds a new authoritative value.
    Set(T),
}

impl<T> FeatureValue<T> {
    /// Whether the field is omitted from the wire message.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Borrow the new value, if any.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unchanged | Self::Cleared => None,
        }
    }

    /// Build a field that either sets a value or clears it.
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Cleared, Self::Set)
    }
}

impl<T> Default for FeatureValue<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T: Serialize> Serialize for FeatureValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Unchanged | Self::Cleared => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FeatureValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}

/// Feature update pushed from the plugin side for one provider handle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmProviderFeatures {
    /// Badge count shown next to the provider.
    #[serde(default, skip_serializing_if = "FeatureValue::is_unchanged")]
    pub count: FeatureValue<u32>,
    /// Template pre-filled into the commit input box.
    #[serde(default, skip_serializing_if = "FeatureValue::is_unchanged")]
    pub commit_template: FeatureValue<String>,
    /// Whether the plugin registered a quick diff provider.
    #[serde(default, skip_serializing_if = "FeatureValue::is_unchanged")]
    pub has_quick_diff_provider: FeatureValue<bool>,
    /// Command run when the user accepts the input box.
    #[serde(default, skip_serializing_if = "FeatureValue::is_unchanged")]
    pub accept_input_command: FeatureValue<StatusBarCommand>,
    /// Ordered status bar entries for the provider.
    #[serde(default, skip_serializing_if = "FeatureValue::is_unchanged")]
    pub status_bar_commands: FeatureValue<Vec<StatusBarCommand>>,
}

impl ScmProviderFeatures {
    /// An update that touches no field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every field is left unchanged.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count.is_unchanged()
            && self.commit_template.is_unchanged()
            && self.has_quick_diff_provider.is_unchanged()
            && self.accept_input_command.is_unchanged()
            && self.status_bar_commands.is_unchanged()
    }
}

/// Feature snapshot held by the host for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    /// Badge count shown next to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Template pre-filled into the commit input box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_template: Option<String>,
    /// Whether the plugin registered a quick diff provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_quick_diff_provider: Option<bool>,
    /// Command run when the user accepts the input box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_input_command: Option<StatusBarCommand>,
    /// Ordered status bar entries for the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_commands: Option<Vec<StatusBarCommand>>,
}

impl FeatureSet {
    /// Merge an update into the snapshot. Unchanged fields keep their value.
    pub fn apply(&mut self, update: &ScmProviderFeatures) {
        merge(&mut self.count, &update.count);
        merge(&mut self.commit_template, &update.commit_template);
        merge(
            &mut self.has_quick_diff_provider,
            &update.has_quick_diff_provider,
        );
        merge(&mut self.accept_input_command, &update.accept_input_command);
        merge(&mut self.status_bar_commands, &update.status_bar_commands);
    }

    /// Build a snapshot from only the fields present in the update.
    #[must_use]
    pub fn replace(update: &ScmProviderFeatures) -> Self {
        let mut snapshot = Self::default();
        snapshot.apply(update);
        snapshot
    }
}

fn merge<T: Clone>(slot: &mut Option<T>, value: &FeatureValue<T>) {
    match value {
        FeatureValue::Unchanged => {}
        FeatureValue::Cleared => *slot = None,
        FeatureValue::Set(value) => *slot = Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Command, StatusBarCommand};

    #[test]
    fn unchanged_fields_are_omitted() {
        let update = ScmProviderFeatures {
            count: FeatureValue::Set(5),
            ..ScmProviderFeatures::new()
        };
        let json = serde_json::to_string(&update).expect("serialize update");
        assert_eq!(json, r#"{"count":5}"#);
    }

    #[test]
    fn cleared_fields_are_sent_as_null() {
        let update = ScmProviderFeatures {
            commit_template: FeatureValue::Cleared,
            ..ScmProviderFeatures::new()
        };
        let json = serde_json::to_string(&update).expect("serialize update");
        assert_eq!(json, r#"{"commitTemplate":null}"#);
    }

    #[test]
    fn decodes_absent_null_and_present_fields() {
        let json = r#"{
            "count": null,
            "hasQuickDiffProvider": true,
            "statusBarCommands": [{"id": "git.sync", "text": "", "alignment": 1}]
        }"#;
        let update: ScmProviderFeatures = serde_json::from_str(json).expect("deserialize update");

        assert_eq!(update.count, FeatureValue::Cleared);
        assert_eq!(update.commit_template, FeatureValue::Unchanged);
        assert_eq!(update.has_quick_diff_provider, FeatureValue::Set(true));
        assert_eq!(
            update.status_bar_commands,
            FeatureValue::Set(vec![StatusBarCommand::from_command(&Command::new(
                "git.sync"
            ))])
        );
        assert!(update.accept_input_command.is_unchanged());
    }

    #[test]
    fn apply_keeps_fields_the_update_does_not_touch() {
        let mut snapshot = FeatureSet::default();
        snapshot.apply(&ScmProviderFeatures {
            count: FeatureValue::Set(3),
            commit_template: FeatureValue::Set("feat: ".into()),
            ..ScmProviderFeatures::new()
        });
        snapshot.apply(&ScmProviderFeatures {
            commit_template: FeatureValue::Cleared,
            ..ScmProviderFeatures::new()
        });

        assert_eq!(snapshot.count, Some(3));
        assert!(snapshot.commit_template.is_none());
    }

    #[test]
    fn replace_drops_fields_missing_from_the_update() {
        let snapshot = FeatureSet::replace(&ScmProviderFeatures {
            has_quick_diff_provider: FeatureValue::Set(false),
            ..ScmProviderFeatures::new()
        });
        assert_eq!(snapshot.has_quick_diff_provider, Some(false));
        assert!(snapshot.count.is_none());
        assert!(ScmProviderFeatures::new().is_empty());
    }
}
