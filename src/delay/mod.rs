pub mod profile;
pub mod scheduler;
pub mod sleeper;

pub use profile::{Checkpoint, DelayProfile};
pub use scheduler::{CheckpointOutcome, DelayScheduler};
pub use sleeper::{SleepOutcome, Sleeper, ThreadSleeper};
