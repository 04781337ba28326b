//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::args::CliArgs;

pub(crate) const APP_NAME: &str = "teamy";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "teamy";

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from TOML and overridden by CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory holding persisted unread state and sections.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Graph API root.
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    /// Skips the `/me` lookup when set.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Poll cadences.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Snapshot persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Notification configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Poll cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between conversation list polls.
    #[serde(default = "default_chat_interval_secs")]
    pub chat_interval_secs: u64,

    /// Seconds between watched channel sweeps.
    #[serde(default = "default_channel_interval_secs")]
    pub channel_interval_secs: u64,

    /// Delay between two channel peeks within a sweep.
    #[serde(default = "default_channel_stagger_ms")]
    pub channel_stagger_ms: u64,

    /// Upper bound on channels peeked per sweep.
    #[serde(default = "default_max_watched_channels")]
    pub max_watched_channels: usize,
}

impl PollingConfig {
    #[must_use]
    pub const fn chat_interval(&self) -> Duration {
        Duration::from_secs(self.chat_interval_secs)
    }

    #[must_use]
    pub const fn channel_interval(&self) -> Duration {
        Duration::from_secs(self.channel_interval_secs)
    }

    #[must_use]
    pub const fn channel_stagger(&self) -> Duration {
        Duration::from_millis(self.channel_stagger_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            chat_interval_secs: default_chat_interval_secs(),
            channel_interval_secs: default_channel_interval_secs(),
            channel_stagger_ms: default_channel_stagger_ms(),
            max_watched_channels: default_max_watched_channels(),
        }
    }
}

/// Where snapshots are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files in the data directory.
    #[default]
    File,
    /// Process memory only.
    Memory,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Quiet period before read state is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
}

impl PersistenceConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            backend: StorageBackend::default(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Enable notifications globally.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Use desktop notifications when available.
    #[serde(default = "default_true")]
    pub desktop: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            desktop: true,
        }
    }
}

fn default_graph_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

const fn default_chat_interval_secs() -> u64 {
    15
}

const fn default_channel_interval_secs() -> u64 {
    20
}

const fn default_channel_stagger_ms() -> u64 {
    500
}

const fn default_max_watched_channels() -> usize {
    15
}

const fn default_debounce_ms() -> u64 {
    2000
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(data_dir) = &args.data_dir {
            self.data_dir = Some(data_dir.clone());
        }
        if let Some(user_id) = &args.user_id {
            self.user_id = Some(user_id.clone());
        }
        if let Some(secs) = args.chat_interval {
            self.polling.chat_interval_secs = secs;
        }
        if let Some(secs) = args.channel_interval {
            self.polling.channel_interval_secs = secs;
        }
        if args.memory_store {
            self.persistence.backend = StorageBackend::Memory;
        }
        if args.no_notifications {
            self.notifications.enabled = false;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default data directory.
    #[must_use]
    pub fn default_data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        Self::default_data_dir().map(|dir| dir.join("teamy-unread.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns effective data directory.
    #[must_use]
    pub fn effective_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(Self::default_data_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            data_dir: None,
            graph_base_url: default_graph_base_url(),
            user_id: None,
            polling: PollingConfig::default(),
            persistence: PersistenceConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"
            user_id = "me-123"

            [polling]
            chat_interval_secs = 30

            [persistence]
            backend = "memory"

            [notifications]
            desktop = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.user_id.as_deref(), Some("me-123"));
        assert_eq!(config.polling.chat_interval(), Duration::from_secs(30));
        assert_eq!(config.polling.channel_interval(), Duration::from_secs(20));
        assert_eq!(config.persistence.backend, StorageBackend::Memory);
        assert_eq!(config.persistence.debounce(), Duration::from_secs(2));
        assert!(config.notifications.enabled);
        assert!(!config.notifications.desktop);
        assert_eq!(config.graph_base_url, DEFAULT_GRAPH_BASE_URL);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.polling, PollingConfig::default());
        assert_eq!(config.polling.max_watched_channels, 15);
        assert_eq!(config.polling.channel_stagger(), Duration::from_millis(500));
        assert_eq!(config.persistence.backend, StorageBackend::File);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "teamy-unread",
            "--log-level",
            "trace",
            "--chat-interval",
            "5",
            "--channel-interval",
            "7",
            "--memory-store",
            "--no-notifications",
            "--user-id",
            "someone",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.polling.chat_interval_secs, 5);
        assert_eq!(config.polling.channel_interval_secs, 7);
        assert_eq!(config.persistence.backend, StorageBackend::Memory);
        assert!(!config.notifications.enabled);
        assert_eq!(config.user_id.as_deref(), Some("someone"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let encoded = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let decoded: AppConfig = toml::from_str(&encoded).unwrap();

        assert_eq!(decoded.polling, PollingConfig::default());
        assert_eq!(decoded.persistence, PersistenceConfig::default());
    }
}
