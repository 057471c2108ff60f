use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use sluice::control::ControlFlags;

use super::clock::SimClock;

/// In-memory sink whose contents stay readable after the sink is moved
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Rc<RefCell<Vec<u8>>>);

impl MemorySink {
    pub fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(&self.0.borrow())
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Returns at most `chunk` bytes per read, like a pipe fed in small writes
pub struct ChunkedReader {
    data: io::Cursor<Vec<u8>>,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data: io::Cursor::new(data),
            chunk,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.chunk);
        self.data.read(&mut buf[..len])
    }
}

/// Flips control flags on one read, as a signal arriving mid-transfer would
pub type FlagAction = fn(&ControlFlags);

/// Endless zero input where every read costs simulated time
pub struct ClockedReader {
    clock: SimClock,
    secs_per_read: f64,
    reads: usize,
    on_read: Option<(usize, ControlFlags, FlagAction)>,
}

impl ClockedReader {
    pub fn new(clock: &SimClock, secs_per_read: f64) -> Self {
        Self {
            clock: clock.clone(),
            secs_per_read,
            reads: 0,
            on_read: None,
        }
    }

    /// Run `action` on the flags during read `read` (1-based)
    #[allow(dead_code)]
    pub fn acting_on(mut self, read: usize, flags: &ControlFlags, action: FlagAction) -> Self {
        self.on_read = Some((read, flags.clone(), action));
        self
    }
}

impl Read for ClockedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        if let Some((n, flags, action)) = &self.on_read {
            if *n == self.reads {
                action(flags);
            }
        }
        self.clock.advance(self.secs_per_read);
        buf.fill(0);
        Ok(buf.len())
    }
}

/// Serves `before` bytes, then fails one read with `EINTR` after asking for
/// termination, as a signal arriving mid-read would.
pub struct InterruptingReader {
    remaining: usize,
    flags: ControlFlags,
}

impl InterruptingReader {
    pub fn new(before: usize, flags: &ControlFlags) -> Self {
        Self {
            remaining: before,
            flags: flags.clone(),
        }
    }
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            self.flags.request_termination();
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        let n = buf.len().min(self.remaining);
        buf[..n].fill(1);
        self.remaining -= n;
        Ok(n)
    }
}
