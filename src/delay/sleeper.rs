use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Completed,
    /// Cut short by a signal
    Interrupted,
}

/// Blocking pause used at delay checkpoints
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration) -> io::Result<SleepOutcome>;
}

/// Sleeps the calling thread, reporting signal interruption instead of
/// resuming the remaining time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

#[cfg(unix)]
impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) -> io::Result<SleepOutcome> {
        let request = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        // SAFETY: `request` is a valid timespec; the remainder is not wanted.
        let rc = unsafe { libc::nanosleep(&request, std::ptr::null_mut()) };
        if rc == 0 {
            return Ok(SleepOutcome::Completed);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            Ok(SleepOutcome::Interrupted)
        } else {
            Err(err)
        }
    }
}

#[cfg(not(unix))]
impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) -> io::Result<SleepOutcome> {
        std::thread::sleep(duration);
        Ok(SleepOutcome::Completed)
    }
}
