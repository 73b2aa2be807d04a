//! Configuration for cleantitle.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI)
//! 2. Environment variables (CLEANTITLE_HOME, CLEANTITLE_TITLES, CLEANTITLE_CHECKPOINT)
//! 3. Config file (`--config` or .cleantitle/config.yaml)
//! 4. Defaults (~/.cleantitle)
//!
//! Config file discovery:
//! - Searches current directory and parents for .cleantitle/config.yaml
//! - Paths in config file are relative to the project root (the parent of .cleantitle/)
//!
//! Credentials are read from the environment only.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::ProxyCredentials;
use crate::core::{GeneratorSettings, PipelineSettings, RetryPolicy, DEFAULT_SYSTEM_PROMPT};

/// Channel backfilled when none is configured (GothamChess)
pub const DEFAULT_CHANNEL_ID: &str = "UCQHX6ViZmPsWiYSFAyS0a3Q";

pub const ENV_ANTHROPIC_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_YOUTUBE_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_PROXY_USERNAME: &str = "TRANSCRIPT_PROXY_USERNAME";
pub const ENV_PROXY_PASSWORD: &str = "TRANSCRIPT_PROXY_PASSWORD";

/// Configuration errors that stop the program before any work starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub transcript: TranscriptSettings,
    #[serde(default)]
    pub pipeline: PacingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the project root)
    pub home: Option<String>,
    /// Title store file
    pub titles: Option<String>,
    /// Checkpoint file
    pub checkpoint: Option<String>,
}

/// Which catalog to traverse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub channel_id: String,
    /// Items per page (YouTube caps this at 50)
    pub page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            page_size: 50,
        }
    }
}

/// Model and prompt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub description_char_limit: usize,
    /// Optional system prompt file (relative to the project root)
    pub prompt_path: Option<PathBuf>,
    pub retry: RetryPolicy,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 150,
            description_char_limit: 500,
            prompt_path: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Transcript retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    pub word_limit: usize,
    pub language: String,
    /// Rotating proxy endpoint, used only when proxy credentials are set
    pub proxy_url: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            word_limit: 500,
            language: "en".to_string(),
            proxy_url: "http://p.webshare.io:80".to_string(),
        }
    }
}

/// Batching and rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub batch_size: usize,
    pub item_delay_ms: u64,
    pub batch_delay_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            item_delay_ms: 500,
            batch_delay_ms: 2000,
        }
    }
}

impl PacingSettings {
    pub fn to_pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            batch_size: self.batch_size,
            item_delay: Duration::from_millis(self.item_delay_ms),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Title store file
    pub titles_path: PathBuf,
    /// Checkpoint file
    pub checkpoint_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub catalog: CatalogSettings,
    pub generation: GenerationSettings,
    pub transcript: TranscriptSettings,
    pub pipeline: PacingSettings,
}

impl ResolvedConfig {
    /// System prompt from the configured file, or the built-in one
    pub fn system_prompt(&self) -> Result<String> {
        match &self.generation.prompt_path {
            Some(path) => {
                let prompt = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
                Ok(prompt.trim().to_string())
            }
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Generator settings with the resolved system prompt
    pub fn generator_settings(&self) -> Result<GeneratorSettings> {
        Ok(GeneratorSettings {
            system_prompt: self.system_prompt()?,
            description_char_limit: self.generation.description_char_limit,
            retry: self.generation.retry.clone(),
        })
    }
}

/// API keys and optional proxy credentials
#[derive(Clone)]
pub struct Credentials {
    pub anthropic_api_key: String,
    pub youtube_api_key: String,
    pub proxy: Option<ProxyCredentials>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &"<redacted>")
            .field("youtube_api_key", &"<redacted>")
            .field("proxy", &self.proxy.as_ref().map(|p| p.username.as_str()))
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through a lookup function (non-empty values only)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let anthropic_api_key =
            get(ENV_ANTHROPIC_KEY).ok_or(ConfigError::MissingCredential(ENV_ANTHROPIC_KEY))?;
        let youtube_api_key =
            get(ENV_YOUTUBE_KEY).ok_or(ConfigError::MissingCredential(ENV_YOUTUBE_KEY))?;

        let proxy = match (get(ENV_PROXY_USERNAME), get(ENV_PROXY_PASSWORD)) {
            (Some(username), Some(password)) => Some(ProxyCredentials { username, password }),
            _ => None,
        };

        Ok(Self {
            anthropic_api_key,
            youtube_api_key,
            proxy,
        })
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".cleantitle").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Project root for a config file: the parent of `.cleantitle/`, or the
/// file's own directory for explicitly passed files
fn config_base_dir(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new("."));
    if dir.file_name() == Some(OsStr::new(".cleantitle")) {
        dir.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

/// Combine a parsed config file and environment lookups into a resolved config
fn resolve(
    config_file: Option<PathBuf>,
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let base_dir = config_file.as_deref().map(config_base_dir);
    let from_file = |value: &Option<String>| -> Option<PathBuf> {
        let value = value.as_deref()?;
        Some(match &base_dir {
            Some(base) => resolve_path(base, value),
            None => PathBuf::from(value),
        })
    };

    let home = match env("CLEANTITLE_HOME") {
        Some(env_home) => PathBuf::from(env_home),
        None => match from_file(&file.paths.home) {
            Some(home) => home,
            None => dirs::home_dir()
                .context("Failed to determine home directory")?
                .join(".cleantitle"),
        },
    };

    let titles_path = env("CLEANTITLE_TITLES")
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.titles))
        .unwrap_or_else(|| home.join("titles.json"));

    let checkpoint_path = env("CLEANTITLE_CHECKPOINT")
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.checkpoint))
        .unwrap_or_else(|| home.join("backfill_progress.json"));

    let mut generation = file.generation;
    if let (Some(prompt), Some(base)) = (&generation.prompt_path, &base_dir) {
        if prompt.is_relative() {
            generation.prompt_path = Some(base.join(prompt));
        }
    }

    Ok(ResolvedConfig {
        home,
        titles_path,
        checkpoint_path,
        config_file,
        catalog: file.catalog,
        generation,
        transcript: file.transcript,
        pipeline: file.pipeline,
    })
}

/// Load configuration from all sources.
///
/// `explicit` overrides config file discovery.
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    resolve(config_file, file, |name| std::env::var(name).ok())
}
