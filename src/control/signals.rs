//! Signal handler registration
//!
//! SIGINT, SIGTERM and SIGHUP request termination, SIGUSR1 toggles verbose
//! output and SIGUSR2 toggles buffer adjustment. Handlers are installed
//! without `SA_RESTART` so blocking reads, writes and sleeps return `EINTR`
//! and the loop can notice a termination request promptly.

use super::error::SignalResult;
use super::flags::ControlFlags;
use std::sync::OnceLock;

static HANDLER_FLAGS: OnceLock<ControlFlags> = OnceLock::new();

/// Install process-wide handlers bound to `flags`.
///
/// Only the first set of flags passed here is ever signalled.
#[cfg(unix)]
pub fn install_handlers(flags: &ControlFlags) -> SignalResult<()> {
    let _ = HANDLER_FLAGS.set(flags.clone());

    for (signum, name) in [
        (libc::SIGINT, "SIGINT"),
        (libc::SIGTERM, "SIGTERM"),
        (libc::SIGHUP, "SIGHUP"),
        (libc::SIGUSR1, "SIGUSR1"),
        (libc::SIGUSR2, "SIGUSR2"),
    ] {
        install_one(signum, name)?;
    }
    tracing::debug!("signal handlers installed");
    Ok(())
}

#[cfg(not(unix))]
pub fn install_handlers(flags: &ControlFlags) -> SignalResult<()> {
    let _ = HANDLER_FLAGS.set(flags.clone());
    Ok(())
}

#[cfg(unix)]
fn install_one(signum: libc::c_int, name: &'static str) -> SignalResult<()> {
    use super::error::SignalError;

    let handler: extern "C" fn(libc::c_int) = handle_signal;
    // SAFETY: the action struct is fully initialised before use and the
    // handler only touches atomics.
    let rc = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as libc::sighandler_t;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signum, &action, std::ptr::null_mut())
    };
    if rc != 0 {
        return Err(SignalError::Install {
            signal: name,
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(unix)]
extern "C" fn handle_signal(signum: libc::c_int) {
    let Some(flags) = HANDLER_FLAGS.get() else {
        return;
    };
    match signum {
        libc::SIGUSR1 => flags.toggle_verbose(),
        libc::SIGUSR2 => flags.toggle_adjust(),
        _ => flags.request_termination(),
    }
}
