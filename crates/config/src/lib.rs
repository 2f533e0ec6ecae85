use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "palaver.toml",
    "config/palaver.toml",
    "crates/config/palaver.toml",
    "../palaver.toml",
    "../config/palaver.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub database: DatabaseConfig,
}

/// Process-wide switches and limits that govern message mutation.
///
/// Duration windows are expressed in seconds; `0` disables the window.
///
/// ```
/// use palaver_config::ChatConfig;
///
/// let chat = ChatConfig {
///     edit_duration_seconds: 60,
///     ..ChatConfig::default()
/// };
/// assert_eq!(chat.edit_window(), Some(60));
/// assert_eq!(chat.delete_window(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub disable_chat: bool,
    #[serde(default)]
    pub disable_editing: bool,
    #[serde(default)]
    pub edit_duration_seconds: u64,
    #[serde(default)]
    pub delete_duration_seconds: u64,
    #[serde(default = "ChatConfig::default_maximum_message_length")]
    pub maximum_message_length: usize,
}

impl ChatConfig {
    const fn default_maximum_message_length() -> usize {
        1000
    }

    /// Edit window in seconds, or `None` when edits never expire.
    pub fn edit_window(&self) -> Option<u64> {
        Some(self.edit_duration_seconds).filter(|seconds| *seconds > 0)
    }

    /// Delete window in seconds, or `None` when deletes never expire.
    pub fn delete_window(&self) -> Option<u64> {
        Some(self.delete_duration_seconds).filter(|seconds| *seconds > 0)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            disable_chat: false,
            disable_editing: false,
            edit_duration_seconds: 0,
            delete_duration_seconds: 0,
            maximum_message_length: Self::default_maximum_message_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://palaver.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use palaver_config::load;
///
/// std::env::remove_var("PALAVER_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.database.url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let edit_duration = i64::try_from(defaults.chat.edit_duration_seconds).unwrap_or(i64::MAX);
    let delete_duration =
        i64::try_from(defaults.chat.delete_duration_seconds).unwrap_or(i64::MAX);
    let max_length = i64::try_from(defaults.chat.maximum_message_length).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("chat.disable_chat", defaults.chat.disable_chat)?
        .set_default("chat.disable_editing", defaults.chat.disable_editing)?
        .set_default("chat.edit_duration_seconds", edit_duration)?
        .set_default("chat.delete_duration_seconds", delete_duration)?
        .set_default("chat.maximum_message_length", max_length)?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?;

    let environment_overrides = config::Environment::with_prefix("PALAVER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("PALAVER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PALAVER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded palaver configuration");
    Ok(config)
}
