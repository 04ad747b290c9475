//! Errors for the fallible construction paths.
//!
//! Emitting a record never fails; only building the pieces that emit can.

use tracing_subscriber::util::TryInitError;

/// Returned by `str::parse::<Level>()` for an unknown severity name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized log level: {0:?}")]
pub struct LevelParseError(pub String);

/// Error type returned when an [`AsyncRelay`](crate::relay::AsyncRelay)
/// cannot start its background consumer.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("failed to spawn relay worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("tokio-hosted relay requires a running tokio runtime")]
    NoRuntime,
}

/// Error type returned by [`init_tracing`](crate::init::init_tracing).
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install global subscriber: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}
