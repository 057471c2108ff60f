use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use sluice::control::ControlFlags;
use sluice::delay::{SleepOutcome, Sleeper};
use sluice::rate::Clock;
use sluice::transfer::{TransferError, TransferResult};

/// Shared simulated wall clock, in seconds
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<f64>>);

impl SimClock {
    pub fn secs(&self) -> f64 {
        self.0.get()
    }

    pub fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }
}

impl Clock for SimClock {
    fn now(&self) -> TransferResult<f64> {
        Ok(self.secs())
    }
}

/// Clock that stops answering from its nth reading (1-based)
#[derive(Debug)]
pub struct FailingClock {
    clock: SimClock,
    readings: Cell<usize>,
    fail_from: usize,
}

impl FailingClock {
    #[allow(dead_code)]
    pub fn new(clock: &SimClock, fail_from: usize) -> Self {
        Self {
            clock: clock.clone(),
            readings: Cell::new(0),
            fail_from,
        }
    }
}

impl Clock for FailingClock {
    fn now(&self) -> TransferResult<f64> {
        self.readings.set(self.readings.get() + 1);
        if self.readings.get() >= self.fail_from {
            return Err(TransferError::Time("clock unavailable".into()));
        }
        self.clock.now()
    }
}

/// Sleeper that advances a `SimClock` and records every requested sleep
#[derive(Debug)]
pub struct SimSleeper {
    clock: SimClock,
    pub slept: Vec<Duration>,
    /// Request termination and report an interruption on this sleep (1-based)
    terminate_on: Option<(usize, ControlFlags)>,
}

impl SimSleeper {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            slept: Vec::new(),
            terminate_on: None,
        }
    }

    #[allow(dead_code)]
    pub fn terminating_on(mut self, sleep: usize, flags: &ControlFlags) -> Self {
        self.terminate_on = Some((sleep, flags.clone()));
        self
    }
}

impl Sleeper for SimSleeper {
    fn sleep(&mut self, duration: Duration) -> io::Result<SleepOutcome> {
        self.slept.push(duration);
        if let Some((n, flags)) = &self.terminate_on {
            if *n == self.slept.len() {
                flags.request_termination();
                return Ok(SleepOutcome::Interrupted);
            }
        }
        self.clock.advance(duration.as_secs_f64());
        Ok(SleepOutcome::Completed)
    }
}
