//! Error types for ChainLab

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabError {
    NotAuthorized,
    AlreadyRegistered,
    AlreadyVoted,
    InvalidCandidate { index: usize, total: usize },
    InvalidIdentity(String),
    InvalidBlock(String),
    InvalidBlockLinkage,
    DatabaseError(String),
    SerializationError(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for LabError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LabError::NotAuthorized => write!(f, "Not authorized"),
            LabError::AlreadyRegistered => write!(f, "Already registered"),
            LabError::AlreadyVoted => write!(f, "Already voted"),
            LabError::InvalidCandidate { index, total } => {
                write!(f, "Invalid candidate: index {} out of {} candidates", index, total)
            }
            LabError::InvalidIdentity(msg) => write!(f, "Invalid identity: {}", msg),
            LabError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            LabError::InvalidBlockLinkage => write!(f, "Invalid block linkage"),
            LabError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            LabError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            LabError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            LabError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for LabError {}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::SerializationError(err.to_string())
    }
}

impl From<rusqlite::Error> for LabError {
    fn from(err: rusqlite::Error) -> Self {
        LabError::DatabaseError(err.to_string())
    }
}

impl From<toml::de::Error> for LabError {
    fn from(err: toml::de::Error) -> Self {
        LabError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LabError>;
