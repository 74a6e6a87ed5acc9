//! TOML-based configuration for the merge viewer.
//!
//! The configuration is resolved once (file, then environment overrides, then
//! validation) and handed to
//! [`MergeViewerController::new`](crate::controller::MergeViewerController::new).
//! Nothing in the controller reads preferences ambiently.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Environment variable that overrides `viewer.save_policy`.
///
/// Headless test harnesses set this to `silent_flush`.
pub const SAVE_POLICY_ENV: &str = "MERGEVIEW_SAVE_POLICY";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level viewer configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Viewer behaviour.
    #[serde(default)]
    pub viewer: ViewerSettings,

    /// Prompt texts.
    #[serde(default)]
    pub messages: MessageConfig,

    /// Logging settings for hosts that install a subscriber.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// How pending edits are resolved before the bound input changes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Flush both sides without asking. Intended for headless runs.
    SilentFlush,
    /// Ask the user: save, discard or cancel.
    #[default]
    Confirm,
    /// Flush without asking.
    AlwaysFlush,
}

impl SavePolicy {
    /// Parse a policy name as written in the config file.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "silent_flush" => Some(Self::SilentFlush),
            "confirm" => Some(Self::Confirm),
            "always_flush" => Some(Self::AlwaysFlush),
            _ => None,
        }
    }
}

impl std::fmt::Display for SavePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SilentFlush => write!(f, "silent_flush"),
            Self::Confirm => write!(f, "confirm"),
            Self::AlwaysFlush => write!(f, "always_flush"),
        }
    }
}

/// Viewer behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// Resolution policy for pending edits.
    #[serde(default)]
    pub save_policy: SavePolicy,

    /// Whether the ancestor pane is shown for three-way inputs.
    #[serde(default)]
    pub ancestor_visible: bool,

    /// Treat every input as two-way; hides and locks the ancestor pane.
    #[serde(default)]
    pub ignore_ancestor: bool,

    /// Show the right model on the left and vice versa.
    #[serde(default)]
    pub mirrored: bool,

    /// Whether the left model may be edited.
    #[serde(default = "default_true")]
    pub left_editable: bool,

    /// Whether the right model may be edited.
    #[serde(default = "default_true")]
    pub right_editable: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            save_policy: SavePolicy::default(),
            ancestor_visible: false,
            ignore_ancestor: false,
            mirrored: false,
            left_editable: true,
            right_editable: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Texts shown by the confirmer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_save_title")]
    pub save_title: String,

    #[serde(default = "default_save_message")]
    pub save_message: String,

    #[serde(default = "default_changed_title")]
    pub resource_changed_title: String,

    #[serde(default = "default_changed_message")]
    pub resource_changed_message: String,
}

fn default_save_title() -> String {
    "Save Resource".into()
}
fn default_save_message() -> String {
    "The comparison has been modified. Save changes?".into()
}
fn default_changed_title() -> String {
    "Resource Changed".into()
}
fn default_changed_message() -> String {
    "The resource being compared was changed outside the viewer. \
     Save your changes before they are replaced?"
        .into()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            save_title: default_save_title(),
            save_message: default_save_message(),
            resource_changed_title: default_changed_title(),
            resource_changed_message: default_changed_message(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl ViewerConfig {
    /// Load a [`ViewerConfig`] from a TOML file at the given path.
    ///
    /// This does **not** apply environment overrides -- call
    /// [`apply_env_overrides`](Self::apply_env_overrides) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_save_policy_override(std::env::var(SAVE_POLICY_ENV).ok().as_deref())
    }

    fn apply_save_policy_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        match value {
            None => Ok(()),
            Some("") => {
                warn!(env = SAVE_POLICY_ENV, "env var is set but empty");
                Ok(())
            }
            Some(raw) => {
                let policy = SavePolicy::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
                    field: SAVE_POLICY_ENV.into(),
                    detail: format!(
                        "unknown save policy '{}' (expected silent_flush, confirm or always_flush)",
                        raw
                    ),
                })?;
                debug!(env = SAVE_POLICY_ENV, %policy, "save policy overridden");
                self.viewer.save_policy = policy;
                Ok(())
            }
        }
    }

    /// Validate that all fields are present and consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewer.ignore_ancestor && self.viewer.ancestor_visible {
            return Err(ConfigError::InvalidValue {
                field: "viewer.ancestor_visible".into(),
                detail: "ancestor pane cannot be visible while ignore_ancestor is set".into(),
            });
        }

        let messages = [
            ("messages.save_title", &self.messages.save_title),
            ("messages.save_message", &self.messages.save_message),
            (
                "messages.resource_changed_title",
                &self.messages.resource_changed_title,
            ),
            (
                "messages.resource_changed_message",
                &self.messages.resource_changed_message,
            ),
        ];
        for (field, text) in messages {
            if text.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "prompt text must not be empty".into(),
                });
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Convenience: load, apply overrides, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}
