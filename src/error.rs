use thiserror::Error;

use crate::core::HandshakeError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to start a session
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}
