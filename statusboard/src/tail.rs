//! Log tailing
//!
//! A `LogSource` follows one append-only text file that some other
//! process keeps writing:
//! - the file is created if it does not exist yet, and reading starts at
//!   its current end, so only lines written after startup are seen;
//! - complete lines are handed out one at a time, partial lines are held
//!   back until their terminator arrives;
//! - when a read hits end of file, the path is stat'ed once. If it now
//!   names a different inode, the writer has rotated the log (closed it
//!   and recreated it), so the old handle is dropped and the new file is
//!   read from its beginning.
//!
//! Rotation detection is best effort: a line written to the old file
//! between the end-of-file check and the reopen is lost.

mod lines;

pub use lines::LineBuf;

use crate::error::{Error, Result};
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Possible outcomes of `LogSource::next_line` other than a line.
#[derive(Debug)]
pub enum ReadError {
    /// No complete line is available at this time.
    NotReady,
    /// The source never opened successfully and will not produce data.
    Unavailable,
    /// Low level IO error.
    IO(io::Error),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::NotReady => write!(f, "no data available"),
            ReadError::Unavailable => write!(f, "source unavailable"),
            ReadError::IO(e) => write!(f, "read failed: {}", e),
        }
    }
}

/// A tailed log file. See the module documentation.
pub struct LogSource {
    path: PathBuf,
    /// Currently open handle. `None` only for sources that failed to open.
    file: Option<File>,
    /// Identity of the file behind `file`, if the platform has one.
    inode: Option<u64>,
    lines: LineBuf,
    /// Bumped every time the handle is replaced.
    generation: u64,
}

/// Opens `path` for appending and reading, creating it if needed.
fn open_append_read(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
}

#[cfg(unix)]
fn file_id(meta: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_id(_meta: &Metadata) -> Option<u64> {
    None
}

impl LogSource {
    /// Creates or opens the file at `path` and positions the read cursor
    /// at its end.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LogSource> {
        let path = path.as_ref().to_path_buf();
        let opened = open_append_read(&path).and_then(|mut file| {
            file.seek(SeekFrom::End(0))?;
            let inode = file_id(&file.metadata()?);
            Ok((file, inode))
        });
        match opened {
            Ok((file, inode)) => {
                info!("Tailing {} (inode {:?})", path.display(), inode);
                Ok(LogSource {
                    path,
                    file: Some(file),
                    inode,
                    lines: LineBuf::new(),
                    generation: 0,
                })
            }
            Err(source) => Err(Error::Open { path, source }),
        }
    }

    /// Returns a source for `path` that never yields data. Used to keep
    /// running when an auxiliary log cannot be opened.
    pub fn unavailable<P: AsRef<Path>>(path: P) -> LogSource {
        LogSource {
            path: path.as_ref().to_path_buf(),
            file: None,
            inode: None,
            lines: LineBuf::new(),
            generation: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Number of times the handle was replaced because of rotation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the next complete line, or `ReadError::NotReady` if none is
    /// available yet. Never blocks on a regular file.
    pub fn next_line(&mut self) -> std::result::Result<String, ReadError> {
        if self.file.is_none() {
            return Err(ReadError::Unavailable);
        }
        let mut rotated = false;
        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(line);
            }
            let file = match self.file.as_mut() {
                Some(file) => file,
                None => return Err(ReadError::Unavailable),
            };
            match self.lines.refill(file) {
                Ok(_) => continue,
                Err(ReadError::NotReady) => {
                    // At most one reopen per call, the new file might be
                    // rotated away again before we get to read it.
                    if rotated || !self.check_rotation().map_err(ReadError::IO)? {
                        return Err(ReadError::NotReady);
                    }
                    rotated = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Called at end of file. Compares the inode currently at `path` with
    /// the one we hold, and reopens if they differ. Returns whether a
    /// reopen took place.
    fn check_rotation(&mut self) -> io::Result<bool> {
        let current = match fs::metadata(&self.path) {
            Ok(meta) => file_id(&meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Removed, and not recreated yet. Keep the old handle.
                trace!("{} is missing, waiting for it to reappear", self.path.display());
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if current.is_none() || current == self.inode {
            return Ok(false);
        }
        self.reopen()?;
        Ok(true)
    }

    /// Replaces the handle with a fresh one on `path`, reading from the
    /// start of the new file.
    fn reopen(&mut self) -> io::Result<()> {
        if self.lines.size() > 0 {
            debug!(
                "Dropping {} bytes of unterminated data from rotated {}",
                self.lines.size(),
                self.path.display()
            );
        }
        let file = open_append_read(&self.path)?;
        let inode = file_id(&file.metadata()?);
        self.lines.flush();
        info!(
            "{} was rotated (inode {:?} -> {:?}), reopened",
            self.path.display(),
            self.inode,
            inode
        );
        self.file = Some(file);
        self.inode = inode;
        self.generation += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sse-system-status.txt");
        let source = LogSource::open(&path).unwrap();
        assert!(path.exists());
        assert!(source.is_open());
        assert_eq!(source.generation(), 0);
    }

    #[test]
    fn starts_at_end_of_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        fs::write(&path, "chan1x old line\n").unwrap();

        let mut source = LogSource::open(&path).unwrap();
        assert!(matches!(source.next_line(), Err(ReadError::NotReady)));

        append(&path, "chan1x new line\n");
        assert_eq!(source.next_line().unwrap(), "chan1x new line");
        assert!(matches!(source.next_line(), Err(ReadError::NotReady)));
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        let mut source = LogSource::open(&path).unwrap();

        append(&path, "dx1001 Idle");
        assert!(matches!(source.next_line(), Err(ReadError::NotReady)));
        append(&path, " No Activities\n");
        assert_eq!(source.next_line().unwrap(), "dx1001 Idle No Activities");
    }

    #[cfg(unix)]
    #[test]
    fn follows_rotated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        let mut source = LogSource::open(&path).unwrap();
        append(&path, "chan1x before\n");
        assert_eq!(source.next_line().unwrap(), "chan1x before");

        // Move the old file aside so the new one cannot reuse its inode.
        fs::rename(&path, dir.path().join("status.txt.1")).unwrap();
        fs::write(&path, "chan1x after\nchan2x after\n").unwrap();

        assert_eq!(source.next_line().unwrap(), "chan1x after");
        assert_eq!(source.next_line().unwrap(), "chan2x after");
        assert_eq!(source.generation(), 1);
        assert!(matches!(source.next_line(), Err(ReadError::NotReady)));
        assert_eq!(source.generation(), 1);
    }

    #[test]
    fn missing_path_keeps_old_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        let mut source = LogSource::open(&path).unwrap();
        fs::rename(&path, dir.path().join("moved.txt")).unwrap();

        assert!(matches!(source.next_line(), Err(ReadError::NotReady)));
        assert_eq!(source.generation(), 0);
    }

    #[test]
    fn unavailable_source_yields_nothing() {
        let mut source = LogSource::unavailable("/nonexistent/errorlog.txt");
        assert!(!source.is_open());
        assert!(matches!(source.next_line(), Err(ReadError::Unavailable)));
    }

    #[test]
    fn open_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("status.txt");
        match LogSource::open(&path) {
            Err(Error::Open { path: reported, .. }) => assert_eq!(reported, path),
            _ => panic!("expected an open error"),
        }
    }
}
