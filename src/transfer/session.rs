//! The adaptive transfer loop
//!
//! One cycle is: delay, fill, delay, drain (+tee), delay, sample and adjust,
//! progress, termination checks. Delays happen only at the checkpoints the
//! delay profile enables.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::TransferConfig;
use super::error::{TransferError, TransferResult};
use super::io::{Sink, Source, WriteOutcome};
use super::progress::Progress;
use crate::buffer::TransferBuffer;
use crate::control::ControlFlags;
use crate::delay::{Checkpoint, CheckpointOutcome, DelayScheduler, Sleeper};
use crate::metrics::{record_cycle, record_delay, record_resize, record_sample, record_stop};
use crate::rate::{Clock, RateController, RateState, SampleInput};
use crate::stats::RunStats;

/// Already-opened endpoints of a transfer
#[derive(Debug)]
pub struct TransferIo {
    pub source: Source,
    pub output: Sink,
    pub tee: Option<Sink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The source returned end-of-stream
    EndOfStream,
    /// The transfer cap was reached
    LimitReached,
    /// The timed-run duration elapsed
    TimedOut,
    /// Termination was requested by signal
    Terminated,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::EndOfStream => "eof",
            StopReason::LimitReached => "limit",
            StopReason::TimedOut => "timed_run",
            StopReason::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferSummary {
    pub stop: StopReason,
    pub total_bytes: u64,
    pub stats: RunStats,
}

/// Counters for one cycle, committed to the run stats once it completes
#[derive(Debug, Default)]
struct CycleTally {
    reads: u64,
    writes: u64,
    delays: u64,
    read_errors: u64,
    bytes: u64,
}

struct Fill {
    len: usize,
    eof: bool,
}

pub struct TransferSession<C, S> {
    config: TransferConfig,
    io: TransferIo,
    buffer: TransferBuffer,
    scheduler: DelayScheduler<S>,
    controller: Option<RateController>,
    clock: C,
    flags: ControlFlags,
    stats: RunStats,
    total_bytes: u64,
    secs_start: f64,
    secs_last: f64,
    eof: bool,
    progress_out: Box<dyn Write>,
    progress_shown: bool,
}

impl<C: Clock, S: Sleeper> TransferSession<C, S> {
    /// Build a session from a validated config. Fails only if the initial
    /// buffer cannot be allocated.
    pub fn new(
        config: TransferConfig,
        io: TransferIo,
        clock: C,
        sleeper: S,
        flags: ControlFlags,
    ) -> TransferResult<Self> {
        let buffer = TransferBuffer::new(config.io_size)?;
        let controller = config
            .target_rate
            .bytes_per_sec()
            .map(|rate| RateController::new(rate, buffer.io_size(), config.policy.clone()));
        let scheduler = DelayScheduler::new(config.delay_profile, sleeper);
        let stats = RunStats::new(buffer.io_size());

        Ok(Self {
            config,
            io,
            buffer,
            scheduler,
            controller,
            clock,
            flags,
            stats,
            total_bytes: 0,
            secs_start: 0.0,
            secs_last: 0.0,
            eof: false,
            progress_out: Box::new(io::stderr()),
            progress_shown: false,
        })
    }

    /// Send the verbose status line somewhere other than stderr
    pub fn with_progress_output<W: Write + 'static>(mut self, out: W) -> Self {
        self.progress_out = Box::new(out);
        self
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn io_size(&self) -> usize {
        self.buffer.io_size()
    }

    /// Current delay budget in microseconds (zero without rate control)
    pub fn delay(&self) -> i64 {
        self.controller.as_ref().map_or(0, |c| c.delay())
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn sleeper(&self) -> &S {
        self.scheduler.sleeper()
    }

    /// Run cycles until end-of-stream, the cap, the timed run or a
    /// termination request. Stats are finalised on both success and error.
    pub fn run(&mut self) -> TransferResult<TransferSummary> {
        self.secs_start = self.clock.now()?;
        self.secs_last = self.secs_start;
        debug!(
            io_size = self.buffer.io_size(),
            delay = self.delay(),
            profile = ?self.config.delay_profile,
            "transfer started"
        );

        let result = self.run_cycles();
        self.finish();

        let stop = result?;
        record_stop(stop);
        info!(
            reason = stop.as_str(),
            total_bytes = self.total_bytes,
            "transfer stopped"
        );
        Ok(TransferSummary {
            stop,
            total_bytes: self.total_bytes,
            stats: self.stats.clone(),
        })
    }

    fn run_cycles(&mut self) -> TransferResult<StopReason> {
        loop {
            if self.flags.is_terminating() {
                return Ok(StopReason::Terminated);
            }
            if self.eof {
                return Ok(StopReason::EndOfStream);
            }
            if let Some(stop) = self.cycle()? {
                return Ok(stop);
            }
        }
    }

    fn cycle(&mut self) -> TransferResult<Option<StopReason>> {
        let mut tally = CycleTally::default();

        if !self.checkpoint(Checkpoint::PreRead, &mut tally)? {
            return Ok(Some(StopReason::Terminated));
        }

        let Some(fill) = self.fill(&mut tally)? else {
            return Ok(Some(StopReason::Terminated));
        };

        if !self.checkpoint(Checkpoint::MidCycle, &mut tally)? {
            return Ok(Some(StopReason::Terminated));
        }

        if fill.len > 0 && !self.drain(fill.len, &mut tally)? {
            return Ok(Some(StopReason::Terminated));
        }
        self.total_bytes += fill.len as u64;

        if fill.eof {
            self.eof = true;
            self.commit(tally);
            return Ok(Some(StopReason::EndOfStream));
        }

        if !self.checkpoint(Checkpoint::PostWrite, &mut tally)? {
            return Ok(Some(StopReason::Terminated));
        }

        let now = self.clock.now()?;
        let (current_rate, state) = self.adjust(now, fill.len);
        self.commit(tally);
        self.report_progress(now, current_rate, state);

        if let Some(limit) = self.config.timed_run {
            if now - self.secs_start >= limit.as_secs_f64() {
                return Ok(Some(StopReason::TimedOut));
            }
        }
        if let Some(max) = self.config.max_trans {
            if self.total_bytes >= max {
                return Ok(Some(StopReason::LimitReached));
            }
        }
        if self.flags.is_terminating() {
            return Ok(Some(StopReason::Terminated));
        }
        Ok(None)
    }

    /// Returns false if the cycle must be abandoned
    fn checkpoint(&mut self, checkpoint: Checkpoint, tally: &mut CycleTally) -> TransferResult<bool> {
        let delay = self.delay();
        match self.scheduler.checkpoint(checkpoint, delay, &self.flags)? {
            CheckpointOutcome::Skipped => Ok(true),
            CheckpointOutcome::Slept => {
                tally.delays += 1;
                record_delay(self.config.delay_profile.share(checkpoint, delay));
                Ok(true)
            }
            CheckpointOutcome::Abandon => Ok(false),
        }
    }

    /// Bytes left before the cap, if one is set
    fn remaining(&self) -> Option<u64> {
        self.config
            .max_trans
            .map(|max| max.saturating_sub(self.total_bytes))
    }

    /// Collect up to one buffer of input. `None` means termination was
    /// requested during an interrupted read.
    fn fill(&mut self, tally: &mut CycleTally) -> TransferResult<Option<Fill>> {
        let mut want = self.buffer.io_size();
        if let Some(remaining) = self.remaining() {
            if remaining < want as u64 {
                want = remaining as usize;
            }
        }

        let buf = &mut self.buffer.as_mut_slice()[..want];
        let reader = match &mut self.io.source {
            Source::Stream(reader) => reader,
            synthetic => {
                synthetic.generate(buf);
                tally.reads += 1;
                return Ok(Some(Fill {
                    len: want,
                    eof: false,
                }));
            }
        };

        let mut filled = 0;
        let mut eof = false;
        while filled < want {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => {
                    filled += n;
                    tally.reads += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    if self.flags.is_terminating() {
                        return Ok(None);
                    }
                }
                Err(e) if self.config.skip_read_errors => {
                    warn!("read error skipped, zero filling {} bytes: {e}", want - filled);
                    buf[filled..].fill(0);
                    filled = want;
                    tally.read_errors += 1;
                }
                Err(e) => return Err(TransferError::Read(e)),
            }
        }
        Ok(Some(Fill { len: filled, eof }))
    }

    /// Write the filled part of the buffer to every sink. Returns false if
    /// the cycle must be abandoned.
    fn drain(&mut self, len: usize, tally: &mut CycleTally) -> TransferResult<bool> {
        let data = &self.buffer.as_slice()[..len];

        if !self.config.discard {
            if !write_to(&mut self.io.output, data, &self.flags, self.config.fsync)? {
                return Ok(false);
            }
            tally.writes += 1;
        }
        if let Some(tee) = self.io.tee.as_mut() {
            if !write_to(tee, data, &self.flags, self.config.fsync)? {
                return Ok(false);
            }
            tally.writes += 1;
        }

        tally.bytes += len as u64;
        record_cycle(len as u64);
        Ok(true)
    }

    fn adjust(&mut self, now: f64, inbufsize: usize) -> (f64, Option<RateState>) {
        let remaining = self.remaining();
        let rearm = self.flags.take_warn_rearm();

        let Some(controller) = self.controller.as_mut() else {
            let elapsed = now - self.secs_start;
            let rate = if elapsed > 0.0 {
                self.total_bytes as f64 / elapsed
            } else {
                0.0
            };
            if elapsed > 0.0 {
                self.stats.observe_rate(rate);
            }
            record_sample(rate, None, 0);
            return (rate, None);
        };
        if rearm {
            controller.rearm_warning();
        }

        let sample = SampleInput {
            total_bytes: self.total_bytes,
            inbufsize: inbufsize as u64,
            io_size: self.buffer.io_size(),
            secs_start: self.secs_start,
            secs_now: now,
            adjust_enabled: self.flags.adjust_enabled(),
        };
        let adjustment = controller.sample(sample, &mut self.stats);
        record_sample(adjustment.current_rate, Some(adjustment.state), controller.delay());
        if adjustment.warned {
            self.stats.underrun_warnings += 1;
        }

        if let Some(size) = adjustment.resize_to {
            let old_size = self.buffer.io_size();
            match self.buffer.resize(size, remaining) {
                Ok(true) => {
                    let io_size = self.buffer.io_size();
                    self.stats.reallocs += 1;
                    self.stats.observe_io_size(io_size);
                    record_resize(io_size);
                    debug!(old_size, io_size, "buffer resized");
                }
                Ok(false) => {}
                Err(e) => debug!(error = ?e, "buffer resize failed, keeping {old_size} bytes"),
            }
        }

        (adjustment.current_rate, Some(adjustment.state))
    }

    fn commit(&mut self, tally: CycleTally) {
        self.stats.reads += tally.reads;
        self.stats.writes += tally.writes;
        self.stats.delays += tally.delays;
        self.stats.read_errors_skipped += tally.read_errors;
        self.stats.total_bytes += tally.bytes;
    }

    fn report_progress(&mut self, now: f64, current_rate: f64, state: Option<RateState>) {
        if !self.flags.verbose() || now - self.secs_last < self.config.report_interval {
            return;
        }
        let progress = Progress {
            current_rate,
            indicator: state.map_or(' ', RateState::indicator),
            total_bytes: self.total_bytes,
            elapsed: now - self.secs_start,
            io_size: self.buffer.io_size(),
            total_size: self.config.total_size,
        };
        let _ = write!(self.progress_out, "{progress}\r");
        let _ = self.progress_out.flush();
        self.progress_shown = true;
        self.secs_last = now;
    }

    fn finish(&mut self) {
        let now = self.clock.now().unwrap_or(self.secs_last);
        self.stats.finalize(now - self.secs_start);
        if self.progress_shown {
            let _ = writeln!(self.progress_out);
        }
    }
}

fn write_to(
    sink: &mut Sink,
    data: &[u8],
    flags: &ControlFlags,
    fsync: bool,
) -> TransferResult<bool> {
    match sink.write_fully(data, flags, fsync) {
        Ok(WriteOutcome::Written) => Ok(true),
        Ok(WriteOutcome::Abandon) => Ok(false),
        Err(source) => Err(TransferError::Write {
            sink: sink.label().to_string(),
            source,
        }),
    }
}
