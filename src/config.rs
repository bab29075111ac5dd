use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chatgpt::config::ChatGPTEngine;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chatgpt_api_key: String,
    pub engine: ChatGPTEngine,
    pub llm_timeout: Duration,
    pub http_timeout: Duration,
    pub dialogue_db: PathBuf,
    pub feedback_file: PathBuf,
    pub wikipedia_language: String,
    pub default_language: String,
    pub use_tools: bool,
}

fn var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match var(name) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

fn engine(name: &'static str) -> Result<ChatGPTEngine, ConfigError> {
    match var(name) {
        None => Ok(ChatGPTEngine::Gpt35Turbo),
        Some(value) => match value.trim() {
            "gpt-3.5-turbo" => Ok(ChatGPTEngine::Gpt35Turbo),
            "gpt-4" => Ok(ChatGPTEngine::Gpt4),
            "gpt-4-32k" => Ok(ChatGPTEngine::Gpt4_32k),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            chatgpt_api_key: var("CHATGPT_API_KEY").ok_or(ConfigError::Missing("CHATGPT_API_KEY"))?,
            engine: engine("CHATGPT_ENGINE")?,
            llm_timeout: Duration::from_secs(parsed("LLM_TIMEOUT_SECS", 15)?),
            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 10)?),
            dialogue_db: PathBuf::from(var("DIALOGUE_DB").unwrap_or_else(|| "db.sqlite".to_string())),
            feedback_file: PathBuf::from(
                var("FEEDBACK_FILE").unwrap_or_else(|| "feedback_data.json".to_string()),
            ),
            wikipedia_language: var("WIKIPEDIA_LANG").unwrap_or_else(|| "en".to_string()),
            default_language: var("DEFAULT_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            use_tools: flag("USE_TOOLS", true)?,
        })
    }
}
