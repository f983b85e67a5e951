use gbce_core::{ErrorKind, ValidationError, WarehouseError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    /// An exchange operation failed; its envelope has already been printed.
    #[error("{message}")]
    Operation { kind: ErrorKind, message: String },

    #[error("invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },

    #[error("invalid setting: {0}")]
    InvalidSetting(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] WarehouseError),

    #[error(transparent)]
    Serve(#[from] gbce_web::ServeError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Operation { kind, .. } => match kind {
                ErrorKind::Validation => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::Conflict => 4,
                ErrorKind::Referential => 5,
                ErrorKind::Storage => 10,
            },
            Self::InvalidLogFilter { .. } | Self::InvalidSetting(_) => 2,
            Self::Serialization(_) => 6,
            Self::Storage(_) | Self::Serve(_) | Self::Io(_) => 10,
        }
    }
}
