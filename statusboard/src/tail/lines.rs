//! Internal buffer assembling complete lines out of a byte stream.

use super::ReadError;
use std::io;

/// Size of a single refill read.
const READ_CHUNK: usize = 4096;

/// A line longer than this without a terminator is handed out as is,
/// so a writer that never emits a newline cannot grow the buffer forever.
const MAX_LINE: usize = 64 * 1024;

/// Buffer used by `LogSource` to turn arbitrary reads into whole lines.
/// Bytes after the last newline are kept until the rest of the line
/// shows up in a later read.
pub struct LineBuf {
    /// Pending data, possibly ending in a partial line.
    buf: Vec<u8>,
}

impl LineBuf {
    /// Returns an empty `LineBuf`.
    pub fn new() -> LineBuf {
        LineBuf {
            buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Amount of buffered data, in bytes.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Removes and returns the next complete line, without its terminator.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> Option<String> {
        let end = match self.buf.iter().position(|&b| b == b'\n') {
            Some(pos) => pos,
            None if self.buf.len() >= MAX_LINE => self.cut_point(),
            None => return None,
        };
        let mut line: Vec<u8> = self.buf.drain(..end).collect();
        if self.buf.first() == Some(&b'\n') {
            self.buf.remove(0);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Where to split an overlong line: `MAX_LINE`, moved back to the
    /// start of a UTF-8 sequence so no character is cut in two.
    fn cut_point(&self) -> usize {
        match std::str::from_utf8(&self.buf[..MAX_LINE]) {
            // Only a truncated sequence at the very end has no error length.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            _ => MAX_LINE,
        }
    }

    /// Discards everything buffered, including a partial line.
    pub fn flush(&mut self) {
        self.buf.clear();
    }

    /// Appends one read worth of data from `reader`.
    /// End of stream is reported as `ReadError::NotReady`.
    pub fn refill<T: io::Read>(&mut self, reader: &mut T) -> Result<usize, ReadError> {
        let mut chunk = [0u8; READ_CHUNK];
        match reader.read(&mut chunk) {
            Ok(0) => Err(ReadError::NotReady),
            Ok(size) => {
                self.buf.extend_from_slice(&chunk[..size]);
                Ok(size)
            }
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Err(ReadError::NotReady),
                _ => Err(ReadError::IO(e)),
            },
        }
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        LineBuf::new()
    }
}
