use std::io::Read;
use std::time::Duration;

use sluice::buffer::IO_SIZE_MAX;
use sluice::cli::setup::open_tee;
use sluice::control::ControlFlags;
use sluice::delay::DelayProfile;
use sluice::rate::AdjustmentPolicy;
use sluice::status::ExitStatus;
use sluice::transfer::{
    Sink, Source, StopReason, TargetRate, TransferConfig, TransferError, TransferIo,
    TransferSession,
};

#[path = "simulation/mod.rs"]
mod simulation;

use simulation::{
    ChunkedReader, ClockedReader, FailingClock, InterruptingReader, MemorySink, SimClock,
    SimSleeper,
};

fn limited(rate: u64, io_size: usize) -> TransferConfig {
    TransferConfig {
        io_size,
        ..TransferConfig::with_rate(rate)
    }
}

fn build(
    config: TransferConfig,
    source: Source,
    output: &MemorySink,
    clock: &SimClock,
    sleeper: SimSleeper,
    flags: ControlFlags,
) -> TransferSession<SimClock, SimSleeper> {
    let io = TransferIo {
        source,
        output: Sink::writer("stdout", output.clone()),
        tee: None,
    };
    TransferSession::new(config, io, clock.clone(), sleeper, flags).unwrap()
}

fn build_simple(
    config: TransferConfig,
    source: Source,
    output: &MemorySink,
    clock: &SimClock,
) -> TransferSession<SimClock, SimSleeper> {
    build(
        config,
        source,
        output,
        clock,
        SimSleeper::new(clock),
        ControlFlags::default(),
    )
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn test_steady_rate_with_direct_law() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1000, 1000);
    config.policy.adjust_shift = 0;
    let mut session = build_simple(
        config,
        Source::stream(std::io::Cursor::new(vec![0u8; 5000])),
        &output,
        &clock,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.total_bytes, 5000);
    assert_eq!(summary.stats.writes, 5);
    assert_eq!(output.len(), 5000);
    assert!((clock.secs() - 5.0).abs() < 1e-6, "ran for {}", clock.secs());
    assert_eq!(summary.stats.perfect, 5);
}

#[test]
fn test_zero_source_with_cap() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1000, 1000);
    config.policy.adjust_shift = 0;
    config.max_trans = Some(5000);
    let mut session = build_simple(config, Source::zero(), &output, &clock);

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::LimitReached);
    assert_eq!(summary.stats.writes, 5);
    assert!(output.contents().iter().all(|&b| b == 0));
    assert!((summary.stats.duration_secs - 5.0).abs() < 1e-6);
}

#[test]
fn test_cap_below_buffer_size() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1000, 1024);
    config.max_trans = Some(100);
    let mut session = build_simple(config, Source::zero(), &output, &clock);

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::LimitReached);
    assert_eq!(summary.total_bytes, 100);
    assert_eq!(summary.stats.reads, 1);
    assert_eq!(summary.stats.writes, 1);
    assert_eq!(output.len(), 100);
}

#[test]
fn test_cap_never_exceeded_by_grown_buffer() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1_000_000, 1000);
    config.policy.grow_on_underrun = true;
    config.policy.underrun_threshold = Some(1);
    config.max_trans = Some(12_345);
    let mut session = build_simple(
        config,
        Source::stream(ClockedReader::new(&clock, 0.01)),
        &output,
        &clock,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::LimitReached);
    assert_eq!(summary.total_bytes, 12_345);
    assert_eq!(output.len(), 12_345);
}

#[test]
fn test_end_of_stream_mid_fill() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let input = pattern(2500);
    let mut session = build_simple(
        limited(1000, 1000),
        Source::stream(ChunkedReader::new(input.clone(), 300)),
        &output,
        &clock,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.stats.writes, 3);
    assert_eq!(output.digest(), blake3::hash(&input));
    // The short final cycle stops before its post-write delay
    assert_eq!(session.sleeper().slept.len(), 2);
}

#[test]
fn test_termination_during_sleep() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let flags = ControlFlags::default();
    let sleeper = SimSleeper::new(&clock).terminating_on(2, &flags);
    let mut session = build(
        limited(1000, 1000),
        Source::zero(),
        &output,
        &clock,
        sleeper,
        flags,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::Terminated);
    assert_eq!(summary.stats.writes, 1);
    assert_eq!(summary.stats.total_bytes, 1000);
    assert_eq!(summary.stats.delays, 1);
}

#[test]
fn test_termination_during_read() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let flags = ControlFlags::default();
    let reader = InterruptingReader::new(1500, &flags);
    let mut session = build(
        limited(1000, 1000),
        Source::stream(reader),
        &output,
        &clock,
        SimSleeper::new(&clock),
        flags,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::Terminated);
    assert_eq!(output.len(), 1000);
    assert_eq!(summary.stats.writes, 1);
}

#[test]
fn test_sustained_underrun_grows_buffer() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1_000_000, 1000);
    config.policy.grow_on_underrun = true;
    config.timed_run = Some(Duration::from_millis(500));
    let mut session = build_simple(
        config,
        Source::stream(ClockedReader::new(&clock, 0.01)),
        &output,
        &clock,
    );

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::TimedOut);
    assert!(summary.stats.underruns >= 10);
    assert!(summary.stats.reallocs >= 1);
    assert!(session.io_size() > 1000);
    assert!(session.io_size() <= IO_SIZE_MAX);
    assert_eq!(summary.stats.io_size_min, 1000);
    assert_eq!(summary.stats.io_size_max, session.io_size());
}

#[test]
fn test_growth_stops_at_maximum() {
    let clock = SimClock::default();
    let mut config = limited(1 << 40, IO_SIZE_MAX - 1);
    config.policy.grow_on_underrun = true;
    config.policy.underrun_threshold = Some(1);
    config.discard = true;
    config.timed_run = Some(Duration::from_millis(50));
    let mut session = build_simple(
        config,
        Source::stream(ClockedReader::new(&clock, 0.01)),
        &MemorySink::default(),
        &clock,
    );

    let summary = session.run().unwrap();

    assert_eq!(session.io_size(), IO_SIZE_MAX);
    assert_eq!(summary.stats.reallocs, 1);
}

#[test]
fn test_sustained_overrun_shrinks_buffer() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(1000, 1000);
    config.policy = AdjustmentPolicy {
        shrink_on_overrun: true,
        const_delay_us: Some(100_000),
        ..Default::default()
    };
    config.timed_run = Some(Duration::from_secs(1));
    let mut session = build_simple(config, Source::zero(), &output, &clock);

    let summary = session.run().unwrap();

    assert!(summary.stats.overruns > 0);
    assert!(session.io_size() < 1000);
    assert!(session.io_size() >= 1);
    // A constant delay is never adjusted
    assert!(session
        .sleeper()
        .slept
        .iter()
        .all(|&d| d == Duration::from_millis(100)));
}

#[test]
fn test_adjustment_toggled_off() {
    let clock = SimClock::default();
    let flags = ControlFlags::default();
    flags.toggle_adjust();
    let mut config = limited(1_000_000, 1000);
    config.policy.grow_on_underrun = true;
    config.timed_run = Some(Duration::from_millis(500));
    let mut session = build(
        config,
        Source::stream(ClockedReader::new(&clock, 0.01)),
        &MemorySink::default(),
        &clock,
        SimSleeper::new(&clock),
        flags,
    );

    let summary = session.run().unwrap();

    assert!(summary.stats.underruns >= 10);
    assert_eq!(summary.stats.reallocs, 0);
    assert_eq!(session.io_size(), 1000);
}

#[test]
fn test_delay_split_across_checkpoints() {
    let clock = SimClock::default();
    let mut config = limited(1000, 1000);
    config.delay_profile = DelayProfile::DelayReadDelayWriteDelay;
    config.max_trans = Some(2000);
    let mut session = build_simple(config, Source::zero(), &MemorySink::default(), &clock);

    let summary = session.run().unwrap();

    assert_eq!(summary.stats.delays, 6);
    let slept = &session.sleeper().slept;
    assert_eq!(slept.len(), 6);
    assert!(slept[..3]
        .iter()
        .all(|&d| d == Duration::from_micros(333_333)));
}

#[test]
fn test_delay_before_read_only() {
    let clock = SimClock::default();
    let mut config = limited(1000, 1000);
    config.delay_profile = DelayProfile::DelayReadWrite;
    config.max_trans = Some(3000);
    let mut session = build_simple(config, Source::zero(), &MemorySink::default(), &clock);

    let summary = session.run().unwrap();

    assert_eq!(summary.stats.delays, 3);
    assert_eq!(session.sleeper().slept[0], Duration::from_secs(1));
}

#[test]
fn test_unlimited_copy_is_identical() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let tee = MemorySink::default();
    let input = pattern(1 << 20);
    let config = TransferConfig {
        target_rate: TargetRate::Unlimited,
        ..Default::default()
    };
    let io = TransferIo {
        source: Source::stream(ChunkedReader::new(input.clone(), 777)),
        output: Sink::writer("stdout", output.clone()),
        tee: Some(Sink::writer("tee", tee.clone())),
    };
    let mut session = TransferSession::new(
        config,
        io,
        clock.clone(),
        SimSleeper::new(&clock),
        ControlFlags::default(),
    )
    .unwrap();

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.total_bytes, input.len() as u64);
    assert_eq!(output.digest(), blake3::hash(&input));
    assert_eq!(tee.digest(), blake3::hash(&input));
    assert!(session.sleeper().slept.is_empty());
}

#[test]
fn test_tee_file_matches_output() {
    let dir = tempfile::tempdir().unwrap();
    let tee_path = dir.path().join("copy.bin");
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(64 * 1024, 4096);
    config.max_trans = Some(100_000);
    let io = TransferIo {
        source: Source::random_seeded(9),
        output: Sink::writer("stdout", output.clone()),
        tee: Some(open_tee(&tee_path, false).unwrap()),
    };
    let mut session = TransferSession::new(
        config,
        io,
        clock.clone(),
        SimSleeper::new(&clock),
        ControlFlags::default(),
    )
    .unwrap();

    session.run().unwrap();
    drop(session);

    let mut written = Vec::new();
    std::fs::File::open(&tee_path)
        .unwrap()
        .read_to_end(&mut written)
        .unwrap();
    assert_eq!(written.len(), 100_000);
    assert_eq!(blake3::hash(&written), output.digest());
}

#[test]
fn test_discard_moves_bytes_without_output() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let mut config = limited(10_000, 1000);
    config.discard = true;
    config.max_trans = Some(5000);
    let mut session = build_simple(config, Source::zero(), &output, &clock);

    let summary = session.run().unwrap();

    assert_eq!(summary.total_bytes, 5000);
    assert_eq!(output.len(), 0);
    assert_eq!(summary.stats.writes, 0);
}

fn progress_lines(sink: &MemorySink) -> usize {
    String::from_utf8(sink.contents()).unwrap().matches("Rate:").count()
}

#[test]
fn test_clock_failure_is_time_error() {
    let clock = SimClock::default();
    let output = MemorySink::default();
    let io = TransferIo {
        source: Source::zero(),
        output: Sink::writer("stdout", output.clone()),
        tee: None,
    };
    let mut session = TransferSession::new(
        limited(1000, 1000),
        io,
        FailingClock::new(&clock, 2),
        SimSleeper::new(&clock),
        ControlFlags::default(),
    )
    .unwrap();

    let err = session.run().unwrap_err();

    assert!(matches!(err, TransferError::Time(_)));
    assert_eq!(ExitStatus::from(&err).code(), 4);
    assert_eq!(ExitStatus::from(&anyhow::Error::from(err)).code(), 4);
    // The failing cycle had already written but never completed
    assert_eq!(output.len(), 1000);
    assert_eq!(session.stats().writes, 0);
    assert!(session.stats().finished_at.is_some());
}

#[test]
fn test_progress_throttled_by_report_interval() {
    let clock = SimClock::default();
    let progress = MemorySink::default();
    let mut config = limited(1000, 1000);
    config.max_trans = Some(6000);
    config.report_interval = 2.0;
    let session = build(
        config,
        Source::zero(),
        &MemorySink::default(),
        &clock,
        SimSleeper::new(&clock),
        ControlFlags::new(true),
    );
    let mut session = session.with_progress_output(progress.clone());

    let summary = session.run().unwrap();

    assert_eq!(summary.stop, StopReason::LimitReached);
    assert_eq!(summary.stats.writes, 6);
    // One line every two seconds over a six second run
    assert_eq!(progress_lines(&progress), 3);
    assert!(progress.contents().ends_with(b"\n"));
}

#[test]
fn test_verbose_toggle_starts_progress_at_next_report() {
    let clock = SimClock::default();
    let progress = MemorySink::default();
    let flags = ControlFlags::new(false);
    let reader = ClockedReader::new(&clock, 0.0).acting_on(4, &flags, ControlFlags::toggle_verbose);
    let mut config = limited(1000, 1000);
    config.max_trans = Some(6000);
    config.report_interval = 2.0;
    let session = build(
        config,
        Source::stream(reader),
        &MemorySink::default(),
        &clock,
        SimSleeper::new(&clock),
        flags,
    );
    let mut session = session.with_progress_output(progress.clone());

    session.run().unwrap();

    // Reports at four and six seconds; nothing before the toggle
    assert_eq!(progress_lines(&progress), 2);
}

#[test]
fn test_quiet_run_writes_no_progress() {
    let clock = SimClock::default();
    let progress = MemorySink::default();
    let mut config = limited(1000, 1000);
    config.max_trans = Some(6000);
    let session = build_simple(config, Source::zero(), &MemorySink::default(), &clock);
    let mut session = session.with_progress_output(progress.clone());

    session.run().unwrap();

    assert_eq!(progress.len(), 0);
}

fn warning_run(flags: ControlFlags, reader: ClockedReader, clock: &SimClock) -> u64 {
    let mut config = limited(1_000_000, 1000);
    config.policy.warn_on_underrun = true;
    config.policy.warn_threshold = 3;
    config.timed_run = Some(Duration::from_millis(500));
    let mut session = build(
        config,
        Source::stream(reader),
        &MemorySink::default(),
        clock,
        SimSleeper::new(clock),
        flags,
    );

    let summary = session.run().unwrap();
    assert!(summary.stats.underruns >= 40);
    summary.stats.underrun_warnings
}

#[test]
fn test_underrun_warning_fires_once() {
    let clock = SimClock::default();
    let flags = ControlFlags::default();
    let reader = ClockedReader::new(&clock, 0.01);

    assert_eq!(warning_run(flags, reader, &clock), 1);
}

#[test]
fn test_adjust_toggle_rearms_underrun_warning() {
    let clock = SimClock::default();
    let flags = ControlFlags::default();
    // Two toggles leave adjustment on but still re-arm the warning
    let reader = ClockedReader::new(&clock, 0.01).acting_on(20, &flags, |flags| {
        flags.toggle_adjust();
        flags.toggle_adjust();
    });

    assert_eq!(warning_run(flags.clone(), reader, &clock), 2);
    assert!(flags.adjust_enabled());
}
