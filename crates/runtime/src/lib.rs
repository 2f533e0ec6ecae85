use std::sync::Arc;

use anyhow::{Context, Result};
use palaver_chats::database::initialize_database;
use palaver_chats::repositories::{
    SqliteMessageRepository, SqliteRoomRepository, SqliteUserRepository,
};
use palaver_chats::{MessageService, MessagingPorts, UserChannels};
use palaver_config::AppConfig;
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything needed to authorize and propagate message mutations.
#[derive(Clone)]
pub struct MessagingRuntime {
    pub db_pool: SqlitePool,
    pub messages: SqliteMessageRepository,
    pub users: SqliteUserRepository,
    pub rooms: SqliteRoomRepository,
    pub channels: UserChannels,
    pub service: MessageService,
}

impl MessagingRuntime {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise chat database")?;

        let messages = SqliteMessageRepository::new(db_pool.clone());
        let users = SqliteUserRepository::new(db_pool.clone());
        let rooms = SqliteRoomRepository::new(db_pool.clone());
        let channels = UserChannels::new();

        let ports = MessagingPorts::new(
            Arc::new(messages.clone()),
            Arc::new(users.clone()),
            Arc::new(users.clone()),
            Arc::new(rooms.clone()),
            Arc::new(channels.clone()),
            &config.chat,
        );
        let service = MessageService::new(ports, config.chat.clone());

        info!(
            disable_chat = config.chat.disable_chat,
            disable_editing = config.chat.disable_editing,
            edit_window = ?config.chat.edit_window(),
            delete_window = ?config.chat.delete_window(),
            "messaging runtime ready"
        );

        Ok(Self {
            db_pool,
            messages,
            users,
            rooms,
            channels,
            service,
        })
    }
}
