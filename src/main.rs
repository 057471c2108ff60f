use std::io::{IsTerminal, Write};
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use sluice::cli::{Endpoints, Options, SetupError};
use sluice::control::{install_handlers, ControlFlags};
use sluice::delay::ThreadSleeper;
use sluice::metrics::{start_metrics_server, MetricsConfig};
use sluice::rate::WallClock;
use sluice::stats::{RunStats, StatsFormat, StatsReport};
use sluice::status::ExitStatus;
use sluice::transfer::TransferSession;

fn main() {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(e) => {
            let _ = e.print();
            let status = if e.use_stderr() {
                ExitStatus::BadOption
            } else {
                ExitStatus::Success
            };
            process::exit(status.code());
        }
    };

    init_logging(options.verbose);

    let status = match run(&options) {
        Ok(()) => ExitStatus::Success,
        Err(err) => {
            error!("{err:#}");
            ExitStatus::from(&err)
        }
    };
    process::exit(status.code());
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: &Options) -> anyhow::Result<()> {
    let mut config = options.to_config().context("invalid options")?;

    let Endpoints {
        io,
        total_size,
        pid_file: _pid_file,
    } = Endpoints::open(options)?;
    config.total_size = total_size;

    let flags = ControlFlags::new(config.verbose);
    install_handlers(&flags).map_err(SetupError::Signal)?;

    if let Some(addr) = options.metrics_addr {
        if let Err(e) = start_metrics_server(MetricsConfig::with_addr(addr)) {
            warn!("metrics disabled: {e}");
        }
    }

    let target_rate = config.target_rate.bytes_per_sec();
    let stats_on_error = config.stats_on_error;
    let mut session = TransferSession::new(config, io, WallClock, ThreadSleeper, flags)
        .context("cannot allocate the I/O buffer")?;

    match session.run() {
        Ok(summary) => {
            if options.stats {
                report(&summary.stats, target_rate, options.stats_format)?;
            }
            Ok(())
        }
        Err(e) => {
            if stats_on_error {
                if let Err(report_err) = report(session.stats(), target_rate, options.stats_format) {
                    warn!("{report_err:#}");
                }
            }
            Err(e.into())
        }
    }
}

fn report(stats: &RunStats, target_rate: Option<u64>, format: StatsFormat) -> anyhow::Result<()> {
    let rendered = StatsReport::new(stats, target_rate)
        .render(format)
        .context("cannot render statistics")?;
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{}", rendered.trim_end()).context("cannot write statistics")?;
    Ok(())
}
