//! The single transfer buffer
//!
//! Owns the bytes moved each cycle and resizes them in place. A resize either
//! takes effect completely or leaves the buffer exactly as it was.

use super::error::{BufferError, BufferResult};

/// Smallest permitted I/O size in bytes
pub const IO_SIZE_MIN: usize = 1;

/// Largest permitted I/O size in bytes (4 MiB)
pub const IO_SIZE_MAX: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct TransferBuffer {
    data: Vec<u8>,
}

impl TransferBuffer {
    /// Allocate a zeroed buffer, clamped to the permitted range
    pub fn new(io_size: usize) -> BufferResult<Self> {
        let mut buffer = Self { data: Vec::new() };
        buffer.resize_exact(Self::clamp_size(io_size, None))?;
        Ok(buffer)
    }

    /// Current I/O size (always equal to the buffer length)
    pub fn io_size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Clamp a requested size to `[IO_SIZE_MIN, IO_SIZE_MAX]` and, when a
    /// transfer cap applies, to the bytes still left to move.
    pub fn clamp_size(requested: usize, remaining: Option<u64>) -> usize {
        let mut size = requested.clamp(IO_SIZE_MIN, IO_SIZE_MAX);
        if let Some(remaining) = remaining {
            let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
            size = size.min(remaining).max(IO_SIZE_MIN);
        }
        size
    }

    /// Resize to `requested` (after clamping), preserving the leading
    /// `min(old, new)` bytes.
    ///
    /// Returns whether the size actually changed. On allocation failure the
    /// buffer and its size are untouched.
    pub fn resize(&mut self, requested: usize, remaining: Option<u64>) -> BufferResult<bool> {
        let new_size = Self::clamp_size(requested, remaining);
        if new_size == self.data.len() {
            return Ok(false);
        }
        self.resize_exact(new_size)?;
        Ok(true)
    }

    fn resize_exact(&mut self, new_size: usize) -> BufferResult<()> {
        let old_size = self.data.len();
        if new_size > old_size {
            // Reserve first so a failure leaves the old contents in place
            self.data
                .try_reserve_exact(new_size - old_size)
                .map_err(|source| BufferError::Allocation {
                    requested: new_size,
                    source,
                })?;
            // Grown bytes are zeroed, which the zero source relies on
            self.data.resize(new_size, 0);
        } else {
            self.data.truncate(new_size);
            self.data.shrink_to_fit();
        }
        Ok(())
    }
}
