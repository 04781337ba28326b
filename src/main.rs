use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use teamy_unread::application::{
    PollerConfig, ResolveTokenUseCase, SectionsService, TokenSource, UnreadBadge, UnreadPoller,
    UnreadStore,
};
use teamy_unread::domain::entities::WatchedChannel;
use teamy_unread::domain::{ChatDataPort, DataSourceError, NotificationPort, SnapshotStoragePort};
use teamy_unread::infrastructure::{
    AppConfig, CliArgs, DesktopNotificationService, FileSnapshotStore, GraphClient,
    KeyringTokenStorage, LogNotificationService, MemorySnapshotStore, SECTIONS_FILE,
    StorageBackend, StorageManager, UNREAD_STATE_FILE,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match StorageManager::new() {
        Ok(manager) => manager
            .load_config(args.config.as_deref())
            .wrap_err("Failed to load configuration")?,
        Err(_) => AppConfig::default(),
    };
    config.merge_with_args(args);
    Ok(config)
}

fn snapshot_stores(
    config: &AppConfig,
) -> (Arc<dyn SnapshotStoragePort>, Arc<dyn SnapshotStoragePort>) {
    let data_dir = match config.persistence.backend {
        StorageBackend::File => config.effective_data_dir(),
        StorageBackend::Memory => None,
    };

    if let Some(dir) = data_dir {
        info!(path = %dir.display(), "Persisting state to data directory");
        return (
            Arc::new(FileSnapshotStore::in_dir(&dir, UNREAD_STATE_FILE)),
            Arc::new(FileSnapshotStore::in_dir(&dir, SECTIONS_FILE)),
        );
    }

    if config.persistence.backend == StorageBackend::File {
        warn!("No data directory available, keeping state in memory");
    }
    let memory: Arc<dyn SnapshotStoragePort> = Arc::new(MemorySnapshotStore::new());
    (Arc::clone(&memory), memory)
}

fn notifier(config: &AppConfig) -> Option<Arc<dyn NotificationPort>> {
    if !config.notifications.enabled {
        return None;
    }
    if config.notifications.desktop {
        Some(Arc::new(DesktopNotificationService::new(true)))
    } else {
        Some(Arc::new(LogNotificationService))
    }
}

fn poller_config(config: &AppConfig) -> PollerConfig {
    PollerConfig {
        chat_interval: config.polling.chat_interval(),
        channel_interval: config.polling.channel_interval(),
        channel_stagger: config.polling.channel_stagger(),
        max_watched_channels: config.polling.max_watched_channels,
    }
}

async fn resolve_user_id(
    config: &AppConfig,
    data_port: &dyn ChatDataPort,
    token_source: TokenSource,
    token_use_case: &ResolveTokenUseCase,
) -> Result<String> {
    if let Some(user_id) = config.user_id.clone() {
        return Ok(user_id);
    }

    match data_port.fetch_current_user_id().await {
        Ok(user_id) => Ok(user_id),
        Err(e @ DataSourceError::TokenRejected { .. }) => {
            if token_source == TokenSource::Keyring {
                warn!("Stored token was rejected, removing it from the keyring");
                token_use_case.forget().await;
            }
            Err(e).wrap_err("Graph rejected the access token")
        }
        Err(e) => Err(e).wrap_err("Failed to resolve signed-in user"),
    }
}

fn spawn_watched_channel_sync(
    mut watched: watch::Receiver<Vec<WatchedChannel>>,
    poller: Arc<UnreadPoller>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while watched.changed().await.is_ok() {
            let channels = watched.borrow_and_update().clone();
            poller.set_watched_channels(channels);
        }
    })
}

fn spawn_section_chat_sync(
    mut chats: watch::Receiver<Vec<String>>,
    poller: Arc<UnreadPoller>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while chats.changed().await.is_ok() {
            let chat_ids = chats.borrow_and_update().clone();
            poller.set_section_chats(chat_ids);
        }
    })
}

fn print_status(store: &UnreadStore) {
    println!("{}", UnreadBadge::tooltip(store.total_unread()));
    for (key, count) in store.unread_entries() {
        println!("  {key}\t{count}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = teamy_unread::VERSION, "Starting {}", teamy_unread::NAME);

    let token_use_case = ResolveTokenUseCase::new(Arc::new(KeyringTokenStorage::new()));
    let resolved = token_use_case.execute(args.token.clone()).await.ok_or_else(|| {
        eyre!("No Graph access token found. Pass --token or set TEAMY_GRAPH_TOKEN.")
    })?;
    info!(source = %resolved.source, token = %resolved.token, "Access token resolved");

    let data_port: Arc<dyn ChatDataPort> = Arc::new(
        GraphClient::with_base_url(&config.graph_base_url, resolved.token.clone())
            .wrap_err("Failed to create Graph client")?,
    );
    let user_id =
        resolve_user_id(&config, data_port.as_ref(), resolved.source, &token_use_case).await?;
    debug!(user_id = %user_id, "Signed-in user");

    let (read_storage, section_storage) = snapshot_stores(&config);
    let unread = UnreadStore::with_persist_delay(
        read_storage,
        Arc::clone(&data_port),
        user_id,
        config.persistence.debounce(),
    );
    let sections = SectionsService::new(section_storage);
    unread.load().await;
    sections.load().await;

    let poller = Arc::new(UnreadPoller::new(
        unread.clone(),
        Arc::clone(&data_port),
        poller_config(&config),
    ));
    poller.set_watched_channels(sections.watched_channels());
    poller.set_section_chats(sections.section_chat_ids());

    if args.status {
        poller.poll_chats().await;
        poller.poll_channels().await;
        print_status(&unread);
        unread.flush().await;
        return Ok(());
    }

    let channel_sync =
        spawn_watched_channel_sync(sections.subscribe_watched_channels(), Arc::clone(&poller));
    let chat_sync =
        spawn_section_chat_sync(sections.subscribe_section_chats(), Arc::clone(&poller));
    let badge = UnreadBadge::new(notifier(&config)).spawn_watcher(unread.subscribe_total());

    poller.poll_chats().await;
    poller.start_polling();
    info!(total = unread.total_unread(), "Watching for unread activity");

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl-C")?;

    info!("Shutting down");
    poller.stop_polling();
    channel_sync.abort();
    chat_sync.abort();
    badge.abort();
    unread.flush().await;

    Ok(())
}
