pub mod error;
pub mod manager;

pub use error::{BufferError, BufferResult};
pub use manager::{TransferBuffer, IO_SIZE_MAX, IO_SIZE_MIN};
