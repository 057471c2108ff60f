//! Metrics recorder for the transfer loop

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::rate::RateState;
use crate::transfer::StopReason;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!("sluice_bytes_total", "Total bytes moved through the pipe");
    describe_counter!("sluice_cycles_total", "Completed transfer cycles");
    describe_counter!("sluice_delays_total", "Delays taken at checkpoints");
    describe_counter!(
        "sluice_rate_samples_total",
        "Rate samples, labelled overrun, underrun or perfect"
    );
    describe_counter!("sluice_reallocs_total", "Buffer reallocations");
    describe_counter!("sluice_stops_total", "Transfer loop exits by reason");

    describe_gauge!("sluice_rate_bytes_per_second", "Running average transfer rate");
    describe_gauge!("sluice_delay_microseconds", "Current delay budget");
    describe_gauge!("sluice_io_size_bytes", "Current buffer size");

    describe_histogram!(
        "sluice_delay_sleep_microseconds",
        "Length of individual checkpoint sleeps"
    );
}

/// Record a completed drain of `bytes`
pub fn record_cycle(bytes: u64) {
    counter!("sluice_cycles_total").increment(1);
    counter!("sluice_bytes_total").increment(bytes);
}

/// Record one checkpoint sleep
pub fn record_delay(micros: i64) {
    counter!("sluice_delays_total").increment(1);
    histogram!("sluice_delay_sleep_microseconds").record(micros as f64);
}

/// Record a rate sample and the resulting delay budget
pub fn record_sample(rate: f64, state: Option<RateState>, delay_us: i64) {
    gauge!("sluice_rate_bytes_per_second").set(rate);
    gauge!("sluice_delay_microseconds").set(delay_us as f64);
    if let Some(state) = state {
        let label = match state {
            RateState::Overrun => "overrun",
            RateState::Underrun => "underrun",
            RateState::Perfect => "perfect",
        };
        counter!("sluice_rate_samples_total", "state" => label).increment(1);
    }
}

/// Record a successful buffer resize
pub fn record_resize(io_size: usize) {
    counter!("sluice_reallocs_total").increment(1);
    gauge!("sluice_io_size_bytes").set(io_size as f64);
}

pub fn record_stop(reason: StopReason) {
    counter!("sluice_stops_total", "reason" => reason.as_str()).increment(1);
}
