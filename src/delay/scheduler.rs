use std::time::Duration;

use super::profile::{Checkpoint, DelayProfile};
use super::sleeper::{SleepOutcome, Sleeper};
use crate::control::ControlFlags;
use crate::transfer::error::{TransferError, TransferResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Checkpoint inactive or nothing to wait for
    Skipped,
    /// A delay was taken (possibly cut short by a non-terminating signal)
    Slept,
    /// Termination was requested while sleeping
    Abandon,
}

/// Applies the delay budget at the checkpoints a profile enables
pub struct DelayScheduler<S> {
    profile: DelayProfile,
    sleeper: S,
}

impl<S: Sleeper> DelayScheduler<S> {
    pub fn new(profile: DelayProfile, sleeper: S) -> Self {
        Self { profile, sleeper }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Sleep this checkpoint's share of `delay_us`.
    ///
    /// An interrupted sleep counts as complete unless termination is pending;
    /// the shortfall shows up in the next rate sample.
    pub fn checkpoint(
        &mut self,
        checkpoint: Checkpoint,
        delay_us: i64,
        flags: &ControlFlags,
    ) -> TransferResult<CheckpointOutcome> {
        let share = self.profile.share(checkpoint, delay_us);
        if share <= 0 {
            return Ok(CheckpointOutcome::Skipped);
        }

        let outcome = self
            .sleeper
            .sleep(Duration::from_micros(share as u64))
            .map_err(TransferError::Delay)?;

        if outcome == SleepOutcome::Interrupted && flags.is_terminating() {
            tracing::debug!(?checkpoint, "sleep interrupted by termination request");
            return Ok(CheckpointOutcome::Abandon);
        }
        Ok(CheckpointOutcome::Slept)
    }
}
