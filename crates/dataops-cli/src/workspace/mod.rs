mod atomic;
mod config;
mod paths;

pub use atomic::write_bytes_atomic;
pub use config::{
    AlertConfig, AppConfig, DatabaseKind, NotifierKind, ServiceCommand, ServicesConfig,
    load_or_create_config,
};
pub use paths::WorkspacePaths;

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid workspace state: {0}")]
    Invalid(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
