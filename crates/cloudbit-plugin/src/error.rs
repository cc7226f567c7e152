//! Plugin error types

use thiserror::Error;

/// Errors raised while serving the plugin protocol
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("This binary is a plugin. These are not meant to be executed directly.\nPlease execute the program that consumes these plugins, which will\nload any plugins automatically")]
    NotLaunchedByTerraform,

    #[error("Terraform requested protocol versions {0:?}, but this provider only speaks version 6")]
    UnsupportedProtocol(String),

    #[error("msgpack error: {0}")]
    Msgpack(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
