use thiserror::Error;

use crate::control::SignalError;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Cannot open {path}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Signal(#[from] SignalError),
}

pub type SetupResult<T> = Result<T, SetupError>;
