//! Running-average rate controller
//!
//! Each sample classifies the transfer as an overrun, underrun or perfect
//! match against the target, then:
//! - corrects the delay budget with the configured control law
//! - asks for a buffer resize after a long enough run in one direction
//! - tracks drift and the sustained-underrun warning

use serde::{Deserialize, Serialize};

use super::policy::{AdjustmentPolicy, ControlLaw, Direction};
use crate::buffer::{IO_SIZE_MAX, IO_SIZE_MIN};
use crate::stats::RunStats;

/// Rates closer than this are considered equal
const RATE_EPSILON: f64 = 1e-6;

/// Fixed term added to every shift-law step, in microseconds
const SHIFT_STEP_US: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateState {
    Overrun,
    Underrun,
    Perfect,
}

impl RateState {
    /// Single-character indicator used in progress output
    pub fn indicator(self) -> char {
        match self {
            RateState::Overrun => '+',
            RateState::Underrun => '-',
            RateState::Perfect => '0',
        }
    }
}

/// Inputs for one rate sample
#[derive(Debug, Clone, Copy)]
pub struct SampleInput {
    pub total_bytes: u64,
    /// Bytes drained by the cycle just finished
    pub inbufsize: u64,
    pub io_size: usize,
    pub secs_start: f64,
    pub secs_now: f64,
    /// Whether buffer adjustment is currently switched on
    pub adjust_enabled: bool,
}

/// Result of one rate sample
#[derive(Debug, Clone, Copy)]
pub struct Adjustment {
    pub current_rate: f64,
    pub state: RateState,
    /// Requested new buffer size, if a resize was triggered
    pub resize_to: Option<usize>,
    /// The sustained-underrun warning fired on this sample
    pub warned: bool,
}

#[derive(Debug, Clone)]
pub struct RateController {
    target_rate: f64,
    policy: AdjustmentPolicy,
    delay: i64,
    last_delay: i64,
    underruns: u32,
    overruns: u32,
    warnings: u32,
    warn_armed: bool,
}

impl RateController {
    /// Start with a delay that would hit the target if every read were
    /// instantaneous, or the constant delay if one is configured.
    pub fn new(target_rate: u64, io_size: usize, policy: AdjustmentPolicy) -> Self {
        let target_rate = target_rate.max(1) as f64;
        let delay = match policy.const_delay_us {
            Some(us) => us as i64,
            None => (io_size as f64 * 1_000_000.0 / target_rate) as i64,
        };
        let warn_armed = policy.warn_on_underrun;
        Self {
            target_rate,
            policy,
            delay,
            last_delay: 0,
            underruns: 0,
            overruns: 0,
            warnings: 0,
            warn_armed,
        }
    }

    /// Current delay budget in microseconds
    pub fn delay(&self) -> i64 {
        self.delay
    }

    /// Allow the sustained-underrun warning to fire again
    pub fn rearm_warning(&mut self) {
        if self.policy.warn_on_underrun {
            self.warnings = 0;
            self.warn_armed = true;
        }
    }

    pub fn sample(&mut self, input: SampleInput, stats: &mut RunStats) -> Adjustment {
        let elapsed = (input.secs_now - input.secs_start).max(f64::MIN_POSITIVE);
        let current_rate = input.total_bytes as f64 / elapsed;
        stats.observe_rate(current_rate);

        let state = if (current_rate - self.target_rate).abs() < RATE_EPSILON {
            RateState::Perfect
        } else if current_rate > self.target_rate {
            RateState::Overrun
        } else {
            RateState::Underrun
        };

        match state {
            RateState::Overrun => {
                self.adjust_delay(state, &input);
                self.underruns = 0;
                self.warnings = 0;
                self.overruns += 1;
                stats.overruns += 1;
            }
            RateState::Underrun => {
                self.adjust_delay(state, &input);
                self.overruns = 0;
                self.underruns += 1;
                self.warnings += 1;
                stats.underruns += 1;
            }
            RateState::Perfect => {
                self.underruns = 0;
                self.overruns = 0;
                self.warnings = 0;
                stats.perfect += 1;
            }
        }
        self.delay = self.delay.max(0);

        let drift = (current_rate - self.target_rate).abs() / self.target_rate * 100.0;
        stats.drift.record(drift);

        let mut resize_to = None;
        if input.adjust_enabled {
            if self.policy.grow_on_underrun
                && self.underruns >= self.policy.threshold(Direction::Grow)
            {
                resize_to = Some(self.resized(Direction::Grow, input.io_size, current_rate));
                self.underruns = 0;
            } else if self.policy.shrink_on_overrun
                && self.overruns >= self.policy.threshold(Direction::Shrink)
            {
                resize_to = Some(self.resized(Direction::Shrink, input.io_size, current_rate));
                self.overruns = 0;
            }
        }

        let mut warned = false;
        if self.warn_armed && self.warnings > self.policy.warn_threshold {
            tracing::warn!(
                "data underrun, use a larger I/O size (-i option) or enable buffer growth (-u option)"
            );
            self.warn_armed = false;
            warned = true;
        }

        self.last_delay = self.delay;

        Adjustment {
            current_rate,
            state,
            resize_to,
            warned,
        }
    }

    fn adjust_delay(&mut self, state: RateState, input: &SampleInput) {
        if self.policy.const_delay_us.is_some() {
            return;
        }
        match self.policy.law() {
            ControlLaw::Shift(shift) => {
                let step = (self.last_delay >> shift) + SHIFT_STEP_US;
                match state {
                    RateState::Overrun => self.delay += step,
                    RateState::Underrun => self.delay -= step,
                    RateState::Perfect => {}
                }
            }
            ControlLaw::Direct => {
                // Instant at which the stream should reach this byte count,
                // counting the just-drained chunk once more
                let bytes = (input.total_bytes + input.inbufsize) as f64;
                let deadline = input.secs_start + bytes / self.target_rate;
                self.delay = ((deadline - input.secs_now) * 1_000_000.0) as i64;
            }
        }
    }

    /// New buffer size one step in `direction`, clamped to the I/O bounds
    fn resized(&self, direction: Direction, io_size: usize, current_rate: f64) -> usize {
        let step = match self.policy.law() {
            ControlLaw::Shift(shift) => (io_size >> shift) as f64,
            ControlLaw::Direct => {
                let secs = match self.policy.const_delay_us {
                    Some(us) => us as f64 / 1_000_000.0,
                    None => self.delay as f64 / 1_000_000.0,
                };
                (self.target_rate - current_rate).abs() * secs
            }
        };
        // Always move by at least one byte so a triggered resize makes progress
        let step = step.max(1.0) as usize;

        match direction {
            Direction::Grow => io_size.saturating_add(step).min(IO_SIZE_MAX),
            Direction::Shrink => io_size.saturating_sub(step).max(IO_SIZE_MIN),
        }
    }
}
