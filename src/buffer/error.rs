use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Cannot allocate buffer of {requested} bytes")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

pub type BufferResult<T> = Result<T, BufferError>;
