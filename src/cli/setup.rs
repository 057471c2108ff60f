//! Opening the transfer endpoints described by the options

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{SetupError, SetupResult};
use super::options::Options;
use crate::transfer::{Sink, Source, TransferIo};

/// Removes the PID file when dropped
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(path: &Path) -> SetupResult<Self> {
        fs::write(path, format!("{}\n", std::process::id())).map_err(|source| file_error(path, source))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), "could not remove pid file: {e}");
        }
    }
}

/// Everything opened before the transfer starts
#[derive(Debug)]
pub struct Endpoints {
    pub io: TransferIo,
    /// Expected transfer size, when the input length or a cap is known
    pub total_size: Option<u64>,
    pub pid_file: Option<PidFile>,
}

impl Endpoints {
    pub fn open(options: &Options) -> SetupResult<Self> {
        let (source, input_len) = open_source(options)?;
        let output = open_stdout(options.pipe_size)?;
        let tee = options
            .tee
            .as_deref()
            .map(|path| open_tee(path, options.append))
            .transpose()?;
        let pid_file = options.pid_file.as_deref().map(PidFile::create).transpose()?;

        Ok(Self {
            io: TransferIo {
                source,
                output,
                tee,
            },
            total_size: expected_size(input_len, options.max),
            pid_file,
        })
    }
}

/// The smaller of the input length and the cap, or whichever is known
pub fn expected_size(input_len: Option<u64>, max_trans: Option<u64>) -> Option<u64> {
    match (input_len, max_trans) {
        (Some(len), Some(max)) => Some(len.min(max)),
        (len, max) => len.or(max),
    }
}

fn file_error(path: &Path, source: io::Error) -> SetupError {
    SetupError::File {
        path: path.display().to_string(),
        source,
    }
}

/// Length of a regular file; pipes and terminals have none
fn regular_len(file: &File) -> Option<u64> {
    file.metadata()
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}

fn open_source(options: &Options) -> SetupResult<(Source, Option<u64>)> {
    if options.zero {
        return Ok((Source::zero(), None));
    }
    if options.random {
        return Ok((Source::random(), None));
    }
    if let Some(path) = options.file.as_deref() {
        let file = File::open(path).map_err(|source| file_error(path, source))?;
        let len = regular_len(&file);
        return Ok((Source::stream(file), len));
    }
    open_stdin(options.pipe_size)
}

/// Duplicate a standard descriptor into a `File` so reads and writes bypass
/// the std buffering layers.
#[cfg(unix)]
fn duplicate<F: std::os::fd::AsFd>(stream: F, label: &str) -> SetupResult<File> {
    stream
        .as_fd()
        .try_clone_to_owned()
        .map(File::from)
        .map_err(|source| file_error(Path::new(label), source))
}

#[cfg(unix)]
fn open_stdin(pipe_size: Option<u64>) -> SetupResult<(Source, Option<u64>)> {
    let file = duplicate(io::stdin(), "stdin")?;
    if let Some(size) = pipe_size {
        set_pipe_size(&file, size, "stdin");
    }
    let len = regular_len(&file);
    Ok((Source::stream(file), len))
}

#[cfg(not(unix))]
fn open_stdin(_pipe_size: Option<u64>) -> SetupResult<(Source, Option<u64>)> {
    Ok((Source::stream(io::stdin()), None))
}

#[cfg(unix)]
fn open_stdout(pipe_size: Option<u64>) -> SetupResult<Sink> {
    let file = duplicate(io::stdout(), "stdout")?;
    if let Some(size) = pipe_size {
        set_pipe_size(&file, size, "stdout");
    }
    Ok(Sink::file("stdout", file))
}

#[cfg(not(unix))]
fn open_stdout(_pipe_size: Option<u64>) -> SetupResult<Sink> {
    Ok(Sink::writer("stdout", io::stdout()))
}

/// Open the tee file owner read/write only, truncating unless appending
pub fn open_tee(path: &Path, append: bool) -> SetupResult<Sink> {
    let mut open = OpenOptions::new();
    open.create(true);
    if append {
        open.append(true);
    } else {
        open.write(true).truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.mode(0o600);
    }
    let file = open.open(path).map_err(|source| file_error(path, source))?;
    Ok(Sink::file(path.display().to_string(), file))
}

/// Ask the kernel for a larger pipe buffer. Failures only lose the hint.
#[cfg(target_os = "linux")]
fn set_pipe_size(file: &File, size: u64, label: &str) {
    use std::os::fd::AsRawFd;

    let size = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
    // SAFETY: fcntl on a descriptor owned by `file` for the whole call
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETPIPE_SZ, size) };
    if rc < 0 {
        debug!(label, "pipe size hint ignored: {}", io::Error::last_os_error());
    } else {
        debug!(label, size = rc, "pipe size set");
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn set_pipe_size(_file: &File, _size: u64, label: &str) {
    debug!(label, "pipe size hint not supported on this platform");
}
