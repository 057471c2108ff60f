use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::delay::DelayProfile;
use crate::rate::policy::{AdjustmentPolicy, ADJUST_SHIFT_DEFAULT};
use crate::stats::StatsFormat;
use crate::transfer::config::REPORT_INTERVAL_DEFAULT;
use crate::transfer::{ConfigError, ConfigResult, TargetRate, TransferConfig};
use crate::units::{parse_duration, parse_size};

/// Copy stdin to stdout at a controlled data rate.
///
/// Sizes accept B, K, M and G suffixes; durations accept s, m, h and d.
#[derive(Debug, Parser)]
#[command(name = "sluice", version)]
pub struct Options {
    /// Target data rate in bytes per second
    #[arg(short = 'r', long, value_parser = parse_size)]
    pub rate: Option<u64>,

    /// Initial I/O buffer size (default: rate / 32, at least 1K)
    #[arg(short = 'i', long = "io-size", value_parser = parse_size)]
    pub io_size: Option<u64>,

    /// Fixed delay between cycles in microseconds, replacing the adaptive delay
    #[arg(short = 'c', long = "const-delay", value_name = "USEC")]
    pub const_delay: Option<u64>,

    /// Copy as fast as possible without rate control
    #[arg(short = 'n', long = "no-rate-control")]
    pub no_rate_control: bool,

    /// Where delays happen in each cycle:
    /// 0 read/write/delay, 1 delay/read/write, 2 read/delay/write,
    /// 3 delay/read/delay/write, 4 delay/read/write/delay,
    /// 5 delay/read/delay/write/delay
    #[arg(short = 'p', long = "delay-mode", default_value_t = 0)]
    pub delay_mode: u8,

    /// Delay and buffer adjustment shift, 0 to solve for the delay directly
    #[arg(short = 's', long, default_value_t = ADJUST_SHIFT_DEFAULT)]
    pub shift: u32,

    /// Stop after transferring this many bytes
    #[arg(short = 'm', long, value_parser = parse_size)]
    pub max: Option<u64>,

    /// Stop after running for this long
    #[arg(short = 'T', long = "timed-run", value_parser = parse_duration)]
    pub timed_run: Option<Duration>,

    /// Also write the data to this file
    #[arg(short = 't', long)]
    pub tee: Option<PathBuf>,

    /// Append to the tee file instead of truncating it
    #[arg(short = 'a', long, requires = "tee")]
    pub append: bool,

    /// Read input from this file instead of stdin
    #[arg(short = 'f', long, conflicts_with_all = ["zero", "random"])]
    pub file: Option<PathBuf>,

    /// Generate zero bytes instead of reading input
    #[arg(short = 'z', long, conflicts_with = "random")]
    pub zero: bool,

    /// Generate random bytes instead of reading input
    #[arg(short = 'R', long)]
    pub random: bool,

    /// Discard the data instead of writing it to stdout
    #[arg(short = 'd', long)]
    pub discard: bool,

    /// Grow the buffer on sustained underrun
    #[arg(short = 'u', long)]
    pub underrun: bool,

    /// Shrink the buffer on sustained overrun
    #[arg(short = 'o', long)]
    pub overrun: bool,

    /// Consecutive underruns before the buffer grows
    #[arg(short = 'U', long = "underrun-threshold", value_name = "N")]
    pub underrun_threshold: Option<u32>,

    /// Consecutive overruns before the buffer shrinks
    #[arg(short = 'O', long = "overrun-threshold", value_name = "N")]
    pub overrun_threshold: Option<u32>,

    /// Warn once when the target rate cannot be kept up
    #[arg(short = 'w', long)]
    pub warn: bool,

    /// Show progress on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Progress update interval in seconds
    #[arg(short = 'F', long = "freq", value_name = "SECS", default_value_t = REPORT_INTERVAL_DEFAULT)]
    pub freq: f64,

    /// Print statistics on exit
    #[arg(short = 'S', long)]
    pub stats: bool,

    #[arg(long = "stats-format", value_enum, default_value_t = StatsFormat::Text)]
    pub stats_format: StatsFormat,

    /// Print statistics even when the transfer fails
    #[arg(long = "stats-on-error")]
    pub stats_on_error: bool,

    /// Replace unreadable input with zeros instead of failing
    #[arg(short = 'e', long = "skip-errors")]
    pub skip_errors: bool,

    /// Flush written data to disk after every write
    #[arg(short = 'y', long)]
    pub fsync: bool,

    /// Write the process id to this file while running
    #[arg(short = 'P', long = "pid-file")]
    pub pid_file: Option<PathBuf>,

    /// Request this pipe buffer size for stdin and stdout (Linux only)
    #[arg(long = "pipe-size", value_parser = parse_size)]
    pub pipe_size: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long = "metrics-addr")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Options {
    /// Resolve the options into a validated transfer config.
    ///
    /// `total_size` is left unset; it depends on the opened input.
    pub fn to_config(&self) -> ConfigResult<TransferConfig> {
        let target_rate = match (self.rate, self.no_rate_control) {
            (Some(rate), false) => TargetRate::Limited(rate),
            (None, true) => TargetRate::Unlimited,
            (Some(_), true) => return Err(ConfigError::Conflict("a target rate")),
            (None, false) => return Err(ConfigError::MissingRate),
        };
        let delay_profile = DelayProfile::from_mode(self.delay_mode)
            .ok_or(ConfigError::DelayModeOutOfRange(self.delay_mode))?;

        let io_size = match (self.io_size, target_rate) {
            (Some(size), _) => usize::try_from(size).unwrap_or(usize::MAX),
            (None, TargetRate::Limited(rate)) => TransferConfig::default_io_size(rate),
            (None, TargetRate::Unlimited) => TransferConfig::default().io_size,
        };

        let policy = AdjustmentPolicy {
            adjust_shift: self.shift,
            grow_on_underrun: self.underrun,
            shrink_on_overrun: self.overrun,
            underrun_threshold: self.underrun_threshold,
            overrun_threshold: self.overrun_threshold,
            warn_on_underrun: self.warn,
            const_delay_us: self.const_delay,
            ..Default::default()
        };

        let config = TransferConfig {
            target_rate,
            io_size,
            delay_profile,
            policy,
            max_trans: self.max,
            timed_run: self.timed_run,
            total_size: None,
            discard: self.discard,
            skip_read_errors: self.skip_errors,
            fsync: self.fsync,
            verbose: self.verbose,
            report_interval: self.freq,
            stats_on_error: self.stats_on_error,
        };
        config.validate()?;
        Ok(config)
    }
}
