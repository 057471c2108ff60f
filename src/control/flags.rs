use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flags flipped asynchronously and sampled once per cycle
#[derive(Debug, Clone)]
pub struct ControlFlags {
    terminate: Arc<AtomicBool>,
    verbose: Arc<AtomicBool>,
    adjust: Arc<AtomicBool>,
    warn_rearm: Arc<AtomicBool>,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ControlFlags {
    pub fn new(verbose: bool) -> Self {
        Self {
            terminate: Arc::new(AtomicBool::new(false)),
            verbose: Arc::new(AtomicBool::new(verbose)),
            adjust: Arc::new(AtomicBool::new(true)),
            warn_rearm: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_termination(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub fn is_terminating(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    pub fn toggle_verbose(&self) {
        self.verbose.fetch_xor(true, Ordering::Relaxed);
    }

    pub fn verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Flip underrun/overrun buffer adjustment and re-arm the underrun warning
    pub fn toggle_adjust(&self) {
        self.adjust.fetch_xor(true, Ordering::Relaxed);
        self.warn_rearm.store(true, Ordering::Relaxed);
    }

    pub fn adjust_enabled(&self) -> bool {
        self.adjust.load(Ordering::Relaxed)
    }

    /// Consume a pending warning re-arm request
    pub fn take_warn_rearm(&self) -> bool {
        self.warn_rearm.swap(false, Ordering::Relaxed)
    }
}
