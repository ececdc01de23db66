use thiserror::Error;

/// Canonical result for core and the crates layered on it.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The unpartitioned entry point was handed a partitioned table.
    #[error("invalid table state: {0}")]
    InvalidTableState(String),

    #[error("unknown field '{field}' (record shape has: {available})")]
    UnknownField { field: String, available: String },

    /// Raw decode failure reported by a deserializer. The materializer wraps
    /// it into `Deserialization` with the record position attached.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("failed to deserialize record at position {position} in {unit}: {reason}")]
    Deserialization {
        unit: String,
        position: u64,
        reason: String,
    },

    #[error("cast error: {0}")]
    Cast(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any error that aborted a scan unit (a table or one partition).
    #[error("scan of {unit} aborted: {source}")]
    Scan {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl Error {
    /// Attach the identity of the scan unit this error aborted.
    ///
    /// Already-attributed errors are returned unchanged.
    pub fn in_unit(self, unit: impl Into<String>) -> Self {
        match self {
            Error::Scan { .. } => self,
            other => Error::Scan {
                unit: unit.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping `Scan` context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Scan { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
