use thiserror::Error;

/// Errors produced while configuring, loading, or running the refiner.
///
/// Per the taxonomy this crate follows: configuration and I/O errors are
/// recoverable at the call site (the CLI turns them into a nonzero exit
/// code); [`Error::InvariantViolation`] indicates a bug in the refiner
/// itself and is only ever raised from debug-assertion-style checks.
#[derive(Error, Debug)]
pub enum Error {
    #[error("error while loading graph")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] graph_builder::Error),

    #[error("malformed coarse-sequence binary data: {detail}")]
    CoarseDumpFormat { detail: String },

    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("refiner invariant violated: {detail}")]
    InvariantViolation { detail: String },
}
