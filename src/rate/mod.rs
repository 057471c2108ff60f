//! Rate control
//!
//! Samples the running average rate once per cycle and steers the delay
//! budget and buffer size toward the target.

pub mod clock;
pub mod controller;
pub mod policy;

pub use clock::{Clock, WallClock};
pub use controller::{Adjustment, RateController, RateState, SampleInput};
pub use policy::{AdjustmentPolicy, ControlLaw, Direction};
