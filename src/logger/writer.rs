//! Log writer module
//!
//! Thread-safe log output to files or stdout/stderr. Targets can be swapped
//! at runtime when a reloaded config names different log files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File { path: PathBuf, file: File },
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File {
                path: PathBuf::from(p),
                file: open_log_file(p)?,
            }),
            None => Ok(fallback),
        }
    }

    fn is_same(&self, path: Option<&str>) -> bool {
        match (self, path) {
            (Self::File { path: current, .. }, Some(p)) => current == Path::new(p),
            (Self::Stdout | Self::Stderr, None) => true,
            _ => false,
        }
    }

    fn write_line(&mut self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File { file, .. } => {
                let _ = writeln!(file, "{message}");
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    access: Mutex<LogTarget>,
    error: Mutex<LogTarget>,
}

fn lock(target: &Mutex<LogTarget>) -> MutexGuard<'_, LogTarget> {
    // A panic mid-write leaves the target usable
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            access: Mutex::new(LogTarget::open(access_log_file, LogTarget::Stdout)?),
            error: Mutex::new(LogTarget::open(error_log_file, LogTarget::Stderr)?),
        })
    }

    pub fn write_access(&self, message: &str) {
        lock(&self.access).write_line(message);
    }

    pub fn write_error(&self, message: &str) {
        lock(&self.error).write_line(message);
    }

    /// Info messages share the access log target
    pub fn write_info(&self, message: &str) {
        lock(&self.access).write_line(message);
    }

    /// Point the access log at a new file (or back to stdout)
    pub fn set_access_log_file(&self, path: Option<&str>) -> io::Result<()> {
        let mut target = lock(&self.access);
        if !target.is_same(path) {
            *target = LogTarget::open(path, LogTarget::Stdout)?;
        }
        Ok(())
    }

    /// Point the error log at a new file (or back to stderr)
    pub fn set_error_log_file(&self, path: Option<&str>) -> io::Result<()> {
        let mut target = lock(&self.error);
        if !target.is_same(path) {
            *target = LogTarget::open(path, LogTarget::Stderr)?;
        }
        Ok(())
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// Returns error if log files cannot be opened or the writer already exists.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer
///
/// Panics if `init()` has not been called.
pub fn get() -> &'static LogWriter {
    LOG_WRITER
        .get()
        .expect("Log writer not initialized. Call logger::writer::init() first.")
}

pub fn is_initialized() -> bool {
    LOG_WRITER.get().is_some()
}
