//! Command-line front end: option parsing and endpoint setup

pub mod error;
pub mod options;
pub mod setup;

pub use error::{SetupError, SetupResult};
pub use options::Options;
pub use setup::{Endpoints, PidFile};
