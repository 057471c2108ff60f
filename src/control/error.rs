use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("sigaction for {signal} failed")]
    Install {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type SignalResult<T> = Result<T, SignalError>;
