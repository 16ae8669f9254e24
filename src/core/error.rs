use thiserror::Error;

/// Boxed error returned by resource factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum XRefError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Resource factory failed: {0}")]
    ResourceFactory(#[source] BoxError),
}

impl XRefError {
    pub(crate) fn entry_not_found(name: &str) -> Self {
        XRefError::NotFound(format!("entry '{}' does not exist", name))
    }

    pub(crate) fn read_only(operation: &str) -> Self {
        XRefError::InvalidState(format!("cannot {} entry in a read-only archive", operation))
    }
}

pub type Result<T> = std::result::Result<T, XRefError>;
