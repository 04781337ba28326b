use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "teamy-unread",
    version,
    about = "Tracks unread chats and channels for a Teamy account",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Directory for persisted unread state and sections.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Graph access token.
    #[arg(short, long, env = "TEAMY_GRAPH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Signed-in user id, skips the profile lookup.
    #[arg(long)]
    pub user_id: Option<String>,

    /// Seconds between conversation polls.
    #[arg(long, value_name = "SECS")]
    pub chat_interval: Option<u64>,

    /// Seconds between channel sweeps.
    #[arg(long, value_name = "SECS")]
    pub channel_interval: Option<u64>,

    /// Keep state in memory only.
    #[arg(long)]
    pub memory_store: bool,

    /// Disable notifications.
    #[arg(long)]
    pub no_notifications: bool,

    /// Poll conversations once, print the unread summary and exit.
    #[arg(long)]
    pub status: bool,
}
