//! In-process simulation of time and I/O for exercising the transfer loop
//!
//! The simulated clock only moves when the simulated sleeper sleeps or a
//! clocked reader charges time for a read, so every run is deterministic.

pub mod clock;
pub mod io;

pub use clock::{SimClock, SimSleeper};
pub use io::{ChunkedReader, ClockedReader, MemorySink};

#[allow(unused_imports)]
pub use clock::FailingClock;
#[allow(unused_imports)]
pub use io::InterruptingReader;
