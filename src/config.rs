use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    backend: BackendConfig,
    chat: ChatConfig,
    retry: RetryConfig,
    knowledge_base: KnowledgeBaseConfig,
    fallback: FallbackConfig,
    actions: ActionsConfig,
    scaffold: ScaffoldConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5005".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub bot_name: String,
    pub export_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bot_name: "SupportSage".to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    pub path: PathBuf,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Conversation.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub threshold: f64,
    pub small_talk_filter: bool,
    pub stop_words: bool,
    pub ngram_max: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            small_talk_filter: true,
            stop_words: false,
            ngram_max: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub bind: String,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5055".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Positional,
    Hashed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub csv: PathBuf,
    pub project_dir: PathBuf,
    pub id_strategy: IdStrategy,
    pub language: String,
    pub assistant_id: Option<String>,
    pub fallback_action: bool,
    pub action_endpoint: String,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("Conversation.csv"),
            project_dir: PathBuf::from("rasa_chatbot"),
            id_strategy: IdStrategy::Positional,
            language: "en".to_string(),
            assistant_id: None,
            fallback_action: true,
            action_endpoint: "http://localhost:5055/webhook".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub backend: BackendConfig,
    pub chat: ChatConfig,
    pub retry: RetryConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub fallback: FallbackConfig,
    pub actions: ActionsConfig,
    pub scaffold: ScaffoldConfig,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(content).context("Failed to parse config file")?;

        Ok(Self {
            backend: config_file.backend,
            chat: config_file.chat,
            retry: config_file.retry,
            knowledge_base: config_file.knowledge_base,
            fallback: config_file.fallback,
            actions: config_file.actions,
            scaffold: config_file.scaffold,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Loads `path` when given; otherwise `config.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.url, "http://localhost:5005");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.fallback.threshold, 0.3);
        assert_eq!(config.fallback.ngram_max, 2);
        assert_eq!(config.scaffold.id_strategy, IdStrategy::Positional);
        assert_eq!(config.scaffold.project_dir, PathBuf::from("rasa_chatbot"));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse(
            r#"
            [backend]
            url = "http://bot.internal:5005"

            [scaffold]
            id_strategy = "hashed"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url, "http://bot.internal:5005");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.scaffold.id_strategy, IdStrategy::Hashed);
        assert!(config.scaffold.fallback_action);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = Config::parse("[scaffold]\nid_strategy = \"random\"").unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/supportsage.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn example_config_matches_defaults() {
        let config = Config::parse(include_str!("../config.example.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.backend.url, defaults.backend.url);
        assert_eq!(config.retry.max_attempts, defaults.retry.max_attempts);
        assert_eq!(config.actions.bind, defaults.actions.bind);
        assert_eq!(config.scaffold.action_endpoint, defaults.scaffold.action_endpoint);
        assert_eq!(config.scaffold.assistant_id, None);
    }
}
