use crate::agent::AgentId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("agent {0} not found in population")]
    AgentNotFound(AgentId),

    #[error("agent {0} cannot be matched against itself")]
    SelfMatch(AgentId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no strategy for node {node} (key \"{key}\") in {}", path.display())]
    MissingStrategy { node: AgentId, key: String, path: PathBuf },

    #[error("unknown update rule: {0}")]
    UnknownRule(String),

    #[error("unknown graph kind: {0}")]
    UnknownGraph(String),

    #[error("network has {network} nodes but population has {population}")]
    SizeMismatch { network: usize, population: usize },

    #[error("pajek parse error at line {line}: {message}")]
    Pajek { line: usize, message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
