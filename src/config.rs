use crate::chat::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::{collections::HashMap, env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const MOOD_FILE: &str = "mood_log.json";
pub const COMMUNITY_FILE: &str = "community_posts.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mood_log_path: PathBuf,
    pub community_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let var = |key: &str| {
            vars.get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = PathBuf::from(var("MINDHAVEN_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let mood_log_path = var("MINDHAVEN_MOOD_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(MOOD_FILE));
        let community_path = var("MINDHAVEN_COMMUNITY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(COMMUNITY_FILE));

        Self {
            port: var("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            mood_log_path,
            community_path,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            chat_model: var("MINDHAVEN_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
        }
    }
}
