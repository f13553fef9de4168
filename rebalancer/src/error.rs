//! Error types for the rebalancer.

use std::path::PathBuf;

/// All errors that can occur during a rebalancer run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("input error: {0}")]
    Input(String),

    #[error("failed to read {path}: {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] nanofolio::Error),

    #[error("no valid allocation: {0}")]
    NoValidAllocation(String),

    #[error("failed to create dump directory {path}: {source}")]
    DumpDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
