//! Plugin-side feature cache and the policy deciding which changes reach the host.

use std::fmt;
use std::sync::Arc;

use scm_api::{Command, FeatureValue, ScmProviderFeatures, StatusBarCommand};
use url::Url;

use crate::ScmExtConfig;

/// Supplies the original version of a modified resource for quick diff.
pub trait QuickDiffProvider: Send + Sync {
    /// Original resource backing `uri`, if any.
    fn provide_original_resource(&self, uri: &Url) -> Option<Url>;
}

/// One requested change to a source control's features.
#[derive(Clone)]
pub enum FeatureDelta {
    /// New badge count.
    Count(Option<u32>),
    /// New quick diff provider.
    QuickDiffProvider(Option<Arc<dyn QuickDiffProvider>>),
    /// New commit message template.
    CommitTemplate(Option<String>),
    /// New accept-input command.
    AcceptInputCommand(Option<Command>),
    /// New status bar commands, in display order.
    StatusBarCommands(Option<Vec<Command>>),
}

impl FeatureDelta {
    /// Short name of the touched feature, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::QuickDiffProvider(_) => "quickDiffProvider",
            Self::CommitTemplate(_) => "commitTemplate",
            Self::AcceptInputCommand(_) => "acceptInputCommand",
            Self::StatusBarCommands(_) => "statusBarCommands",
        }
    }
}

impl fmt::Debug for FeatureDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => f.debug_tuple("Count").field(count).finish(),
            Self::QuickDiffProvider(provider) => f
                .debug_tuple("QuickDiffProvider")
                .field(&provider.is_some())
                .finish(),
            Self::CommitTemplate(template) => {
                f.debug_tuple("CommitTemplate").field(template).finish()
            }
            Self::AcceptInputCommand(command) => {
                f.debug_tuple("AcceptInputCommand").field(command).finish()
            }
            Self::StatusBarCommands(commands) => {
                f.debug_tuple("StatusBarCommands").field(commands).finish()
            }
        }
    }
}

/// Local copy of a source control's features.
#[derive(Clone, Default)]
pub struct LocalFeatures {
    count: Option<u32>,
    quick_diff_provider: Option<Arc<dyn QuickDiffProvider>>,
    commit_template: Option<String>,
    accept_input_command: Option<Command>,
    status_bar_commands: Option<Vec<Command>>,
    retract_cleared_commands: bool,
}

impl LocalFeatures {
    /// Empty cache using the policy from `config`.
    #[must_use]
    pub fn new(config: &ScmExtConfig) -> Self {
        Self {
            retract_cleared_commands: config.retract_cleared_commands,
            ..Self::default()
        }
    }

    /// Record `delta` and return the host update it calls for, if any.
    ///
    /// The cache always takes the new value. Whether the host hears about it
    /// depends on the field:
    /// - `Count` is only sent when the value differs from the cached one.
    /// - `QuickDiffProvider` and `CommitTemplate` are sent on every write.
    /// - `AcceptInputCommand` and `StatusBarCommands` are sent when set. A
    ///   clear is only sent when retraction is enabled.
    pub fn apply(&mut self, delta: FeatureDelta) -> Option<ScmProviderFeatures> {
        let mut update = ScmProviderFeatures::new();
        match delta {
            FeatureDelta::Count(count) => {
                if self.count == count {
                    return None;
                }
                self.count = count;
                update.count = FeatureValue::from_option(count);
            }
            FeatureDelta::QuickDiffProvider(provider) => {
                update.has_quick_diff_provider = FeatureValue::Set(provider.is_some());
                self.quick_diff_provider = provider;
            }
            FeatureDelta::CommitTemplate(template) => {
                update.commit_template = FeatureValue::from_option(template.clone());
                self.commit_template = template;
            }
            FeatureDelta::AcceptInputCommand(command) => {
                update.accept_input_command = match &command {
                    Some(command) => FeatureValue::Set(StatusBarCommand::from_command(command)),
                    None if self.retract_cleared_commands => FeatureValue::Cleared,
                    None => FeatureValue::Unchanged,
                };
                self.accept_input_command = command;
            }
            FeatureDelta::StatusBarCommands(commands) => {
                update.status_bar_commands = match &commands {
                    Some(commands) => FeatureValue::Set(
                        commands.iter().map(StatusBarCommand::from_command).collect(),
                    ),
                    None if self.retract_cleared_commands => FeatureValue::Cleared,
                    None => FeatureValue::Unchanged,
                };
                self.status_bar_commands = commands;
            }
        }
        (!update.is_empty()).then_some(update)
    }

    /// Cached badge count.
    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        self.count
    }

    /// Cached quick diff provider.
    #[must_use]
    pub const fn quick_diff_provider(&self) -> Option<&Arc<dyn QuickDiffProvider>> {
        self.quick_diff_provider.as_ref()
    }

    /// Cached commit template.
    #[must_use]
    pub fn commit_template(&self) -> Option<&str> {
        self.commit_template.as_deref()
    }

    /// Cached accept-input command.
    #[must_use]
    pub const fn accept_input_command(&self) -> Option<&Command> {
        self.accept_input_command.as_ref()
    }

    /// Cached status bar commands.
    #[must_use]
    pub fn status_bar_commands(&self) -> Option<&[Command]> {
        self.status_bar_commands.as_deref()
    }
}

impl fmt::Debug for LocalFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFeatures")
            .field("count", &self.count)
            .field("quick_diff_provider", &self.quick_diff_provider.is_some())
            .field("commit_template", &self.commit_template)
            .field("accept_input_command", &self.accept_input_command)
            .field("status_bar_commands", &self.status_bar_commands)
            .finish_non_exhaustive()
    }
}
