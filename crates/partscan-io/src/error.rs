use thiserror::Error;

/// Result type local to partscan-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input path does not exist: {0}")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<Error> for partscan_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io { path, source } => partscan_core::Error::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
            Error::NotFound(path) => partscan_core::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input path does not exist: {path}"),
            )),
            Error::Config(msg) => partscan_core::Error::Config(msg),
            Error::Serde(e) => partscan_core::Error::Config(e.to_string()),
        }
    }
}
