use thiserror::Error;

/// Library error type for catalog and startup operations.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more configured photo directories are invalid or unreadable.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Rejected `open` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LightboxError {
    /// The catalog has nothing to show.
    #[error("the image catalog is empty")]
    EmptyCatalog,

    /// The requested index is outside `[0, len)`.
    #[error("image index {index} is out of range for a catalog of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Reasons the navigation stack refused a marker push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// History mutation is not allowed in this environment.
    #[error("history mutation is disabled")]
    Disabled,

    /// The stack is already at its maximum depth.
    #[error("history depth limit of {limit} reached")]
    DepthExceeded { limit: usize },
}
