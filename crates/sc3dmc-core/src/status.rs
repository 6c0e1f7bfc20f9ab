use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Sc3dmcError {
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),
    #[error("Invalid sequencing: {0}")]
    InvalidSequencing(String),
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Buffer error: {0}")]
    BufferError(String),
}

pub type Status = Result<(), Sc3dmcError>;

pub type StatusResult<T> = Result<T, Sc3dmcError>;

impl From<TryReserveError> for Sc3dmcError {
    fn from(err: TryReserveError) -> Self {
        Sc3dmcError::AllocationFailure(err.to_string())
    }
}

impl Sc3dmcError {
    /// Re-labels low-level buffer failures as stream corruption.
    ///
    /// Running out of bytes while decoding means the stream lied about its
    /// own layout, which callers see as `CorruptStream`.
    pub fn into_stream_error(self) -> Self {
        match self {
            Sc3dmcError::BufferError(msg) => Sc3dmcError::CorruptStream(msg),
            other => other,
        }
    }
}

pub fn invalid_mesh(msg: impl Into<String>) -> Sc3dmcError {
    Sc3dmcError::InvalidMesh(msg.into())
}

pub fn corrupt_stream(msg: impl Into<String>) -> Sc3dmcError {
    Sc3dmcError::CorruptStream(msg.into())
}
