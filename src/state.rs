use crate::catalog::MoodCatalog;
use crate::chat::{ChatRelay, CompletionService, OpenAiClient};
use crate::config::Config;
use crate::journal::MoodStore;
use crate::session::SessionRegistry;
use crate::wall::WallStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handles only. Both stores are re-read from disk on every request.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<MoodCatalog>,
    pub moods: MoodStore,
    pub wall: WallStore,
    pub relay: ChatRelay,
    pub sessions: SessionRegistry,
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let client = OpenAiClient::new(&config.openai_base_url, config.openai_api_key.clone());
        Self::with_service(config, Arc::new(client))
    }

    pub fn with_service(config: &Config, service: Arc<dyn CompletionService>) -> Self {
        Self {
            catalog: Arc::new(MoodCatalog::builtin()),
            moods: MoodStore::new(&config.mood_log_path),
            wall: WallStore::new(&config.community_path),
            relay: ChatRelay::new(service, &config.chat_model),
            sessions: SessionRegistry::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
