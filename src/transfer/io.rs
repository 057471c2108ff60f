//! Input sources and output sinks
//!
//! Reads and writes are issued one call at a time so that an `EINTR` from a
//! termination signal can be observed between calls.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::control::ControlFlags;

pub enum Source {
    /// Any blocking reader: stdin, a regular file, a pipe
    Stream(Box<dyn Read>),
    /// Endless zero bytes, produced without any read
    Zero,
    /// Endless pseudo-random bytes
    Random(StdRng),
}

impl Source {
    pub fn stream<R: Read + 'static>(reader: R) -> Self {
        Source::Stream(Box::new(reader))
    }

    pub fn zero() -> Self {
        Source::Zero
    }

    pub fn random() -> Self {
        Source::Random(StdRng::from_entropy())
    }

    pub fn random_seeded(seed: u64) -> Self {
        Source::Random(StdRng::seed_from_u64(seed))
    }

    /// Fill `buf` from a synthetic generator. Does nothing for streams.
    pub(crate) fn generate(&mut self, buf: &mut [u8]) {
        match self {
            // The buffer only ever holds zeros for this source
            Source::Zero => {}
            Source::Random(rng) => rng.fill_bytes(buf),
            Source::Stream(_) => {}
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stream(_) => f.write_str("Source::Stream"),
            Source::Zero => f.write_str("Source::Zero"),
            Source::Random(_) => f.write_str("Source::Random"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Interrupted with termination pending; the data may be partly written
    Abandon,
}

enum SinkKind {
    File(File),
    Writer(Box<dyn Write>),
}

/// A destination for transferred bytes
pub struct Sink {
    label: String,
    kind: SinkKind,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("label", &self.label).finish()
    }
}

impl Sink {
    pub fn file(label: impl Into<String>, file: File) -> Self {
        Self {
            label: label.into(),
            kind: SinkKind::File(file),
        }
    }

    pub fn writer<W: Write + 'static>(label: impl Into<String>, writer: W) -> Self {
        Self {
            label: label.into(),
            kind: SinkKind::Writer(Box::new(writer)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn inner(&mut self) -> &mut dyn Write {
        match &mut self.kind {
            SinkKind::File(file) => file,
            SinkKind::Writer(writer) => writer.as_mut(),
        }
    }

    /// Write all of `buf`, retrying after signal interruptions unless
    /// termination has been requested.
    pub fn write_fully(
        &mut self,
        buf: &[u8],
        flags: &ControlFlags,
        fsync: bool,
    ) -> io::Result<WriteOutcome> {
        let mut written = 0;
        while written < buf.len() {
            match self.inner().write(&buf[written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    if flags.is_terminating() {
                        return Ok(WriteOutcome::Abandon);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        loop {
            match self.inner().flush() {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    if flags.is_terminating() {
                        return Ok(WriteOutcome::Abandon);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if fsync {
            self.sync()?;
        }
        Ok(WriteOutcome::Written)
    }

    fn sync(&mut self) -> io::Result<()> {
        match &mut self.kind {
            SinkKind::File(file) => match file.sync_data() {
                // Pipes and terminals cannot be synced
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
                other => other,
            },
            SinkKind::Writer(_) => Ok(()),
        }
    }
}
