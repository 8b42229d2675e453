//! Runtime configuration.
//!
//! Values resolve with a layered precedence: explicit command-line override,
//! then environment variable, then built-in default. `.env` files are loaded
//! by the binary before resolution, so they surface here as plain
//! environment variables.

use crate::error::StoreError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which backend variant the factory should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Disk,
    RemoteCluster,
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<BackendKind, StoreError> {
        match s {
            "memory" => Ok(BackendKind::Memory),
            "disk" => Ok(BackendKind::Disk),
            "remote-cluster" => Ok(BackendKind::RemoteCluster),
            other => Err(StoreError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Embedding API settings.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> EmbeddingConfig {
        EmbeddingConfig {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-ada-002".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Backend selection and per-backend parameters.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub vectors_path: PathBuf,
    pub ids_path: PathBuf,
    pub texts_path: PathBuf,
    pub remote_host: String,
    pub remote_port: u16,
    pub collection: String,
    pub remote_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            backend: BackendKind::Memory,
            vectors_path: PathBuf::from("data/vectors.bin"),
            ids_path: PathBuf::from("data/doc_ids.bin"),
            texts_path: PathBuf::from("data/doc_texts.txt"),
            remote_host: "localhost".to_string(),
            remote_port: 19530,
            collection: "vectors".to_string(),
            remote_timeout_secs: 10,
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 9000,
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Resolves the configuration from the environment on top of the
    /// built-in defaults.
    ///
    /// An unknown `SEMDB_BACKEND` fails with
    /// [`StoreError::UnsupportedBackend`]; unparseable numeric values fail
    /// with [`StoreError::Config`]. Both are fatal at startup.
    pub fn from_env() -> Result<Config, StoreError> {
        let store_defaults = StoreConfig::default();
        let embed_defaults = EmbeddingConfig::default();

        Ok(Config {
            host: env_or("SEMDB_HOST", "0.0.0.0"),
            port: parse_env("SEMDB_PORT", 9000)?,
            store: StoreConfig {
                backend: env_or("SEMDB_BACKEND", "memory").parse()?,
                vectors_path: env_path_or("SEMDB_VECTORS_PATH", store_defaults.vectors_path),
                ids_path: env_path_or("SEMDB_IDS_PATH", store_defaults.ids_path),
                texts_path: env_path_or("SEMDB_TEXTS_PATH", store_defaults.texts_path),
                remote_host: env_or("SEMDB_REMOTE_HOST", &store_defaults.remote_host),
                remote_port: parse_env("SEMDB_REMOTE_PORT", store_defaults.remote_port)?,
                collection: env_or("SEMDB_COLLECTION", &store_defaults.collection),
                remote_timeout_secs: parse_env(
                    "SEMDB_REMOTE_TIMEOUT_SECS",
                    store_defaults.remote_timeout_secs,
                )?,
            },
            embedding: EmbeddingConfig {
                api_url: env_or("AI_API_URL", &embed_defaults.api_url),
                api_key: env_or("AI_API_KEY", &embed_defaults.api_key),
                model: env_or("AI_MODEL", &embed_defaults.model),
                timeout_secs: parse_env("SEMDB_EMBED_TIMEOUT_SECS", embed_defaults.timeout_secs)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path_or(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, StoreError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            StoreError::Config(format!("invalid value for {}: '{}'", key, value))
        }),
        Err(_) => Ok(default),
    }
}
