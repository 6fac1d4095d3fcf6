//! Error types for pushprefs-core
//!
//! Absence of a stored value is never an error; these cover the store,
//! its on-disk representation, and configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pushprefs operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Store Errors
    // ===================
    #[error("Failed to encode partition {partition} as JSON")]
    JsonEncode {
        partition: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Preference {partition}/{key} is not of type {expected}")]
    TypeMismatch {
        partition: String,
        key: String,
        expected: &'static str,
    },

    #[error("Invalid partition name '{name}': {reason}")]
    InvalidPartition { name: String, reason: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub(crate) fn database(message: impl Into<String>, source: rusqlite::Error) -> Self {
        CoreError::Database {
            message: message.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
