//! Asynchronous inputs: keyboard, terminal resize, interrupt.
//!
//! None of these do any drawing or file I/O where they are received. The
//! keyboard thread forwards key presses over a `crossbeam::channel` and
//! wakes the poll loop through its `mio::Waker`; resize and interrupt only
//! set flags, which the loop consumes on its own schedule.

use crossbeam::channel;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

#[derive(Default)]
struct ResizeState {
    pending: AtomicBool,
    /// Columns in the high half, rows in the low half.
    dims: AtomicU32,
}

/// Set when the terminal changes size, consumed by the view at its next
/// render.
#[derive(Clone, Default)]
pub struct ResizeFlag {
    inner: Arc<ResizeState>,
}

impl ResizeFlag {
    pub fn new() -> ResizeFlag {
        ResizeFlag::default()
    }

    /// Records new terminal dimensions.
    pub fn notify(&self, cols: u16, rows: u16) {
        self.inner
            .dims
            .store(((cols as u32) << 16) | rows as u32, Ordering::Relaxed);
        self.inner.pending.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Returns the latest dimensions as `(cols, rows)` if a resize happened
    /// since the last call, clearing the flag.
    pub fn take(&self) -> Option<(u16, u16)> {
        if self.inner.pending.swap(false, Ordering::AcqRel) {
            let dims = self.inner.dims.load(Ordering::Relaxed);
            Some(((dims >> 16) as u16, (dims & 0xffff) as u16))
        } else {
            None
        }
    }
}

/// Shared "please exit" flag, raised by SIGINT/SIGTERM or by Ctrl-C while
/// the terminal is in raw mode.
#[derive(Clone, Default)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> ShutdownFlag {
        ShutdownFlag::default()
    }

    /// Creates a flag and hooks SIGINT and SIGTERM to it. Registration is
    /// best effort; failures are logged.
    pub fn register() -> ShutdownFlag {
        let shutdown = ShutdownFlag::new();
        #[cfg(unix)]
        {
            use signal_hook::consts::{SIGINT, SIGTERM};
            for signal in [SIGINT, SIGTERM] {
                if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&shutdown.flag)) {
                    warn!("Failed to register handler for signal {}: {}", signal, e);
                }
            }
        }
        shutdown
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Starts the keyboard thread. Plain character keys are forwarded on the
/// returned channel; resize events update `resize`; Ctrl-C raises
/// `shutdown`. Every forwarded event wakes `waker`.
pub fn spawn_keyboard(
    waker: Arc<mio::Waker>,
    resize: ResizeFlag,
    shutdown: ShutdownFlag,
) -> channel::Receiver<char> {
    let (tx, rx) = channel::unbounded::<char>();
    thread::spawn(move || loop {
        let ev = match event::read() {
            Ok(ev) => ev,
            Err(e) => {
                warn!("Keyboard input failed, no further keys will be read: {}", e);
                break;
            }
        };
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    shutdown.request();
                } else if let KeyCode::Char(c) = key.code {
                    if tx.send(c).is_err() {
                        debug!("Key channel closed, keyboard thread exiting");
                        break;
                    }
                } else {
                    continue;
                }
            }
            Event::Resize(cols, rows) => resize.notify(cols, rows),
            _ => continue,
        }
        if let Err(e) = waker.wake() {
            warn!("Failed to wake poll loop: {}", e);
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_flag_is_consumed_once() {
        let flag = ResizeFlag::new();
        assert!(!flag.is_pending());
        assert_eq!(flag.take(), None);

        let handle = flag.clone();
        handle.notify(132, 43);
        handle.notify(100, 30);
        assert!(flag.is_pending());
        assert_eq!(flag.take(), Some((100, 30)));
        assert_eq!(flag.take(), None);
    }

    #[test]
    fn shutdown_flag_is_shared() {
        let shutdown = ShutdownFlag::new();
        let other = shutdown.clone();
        assert!(!shutdown.is_requested());
        other.request();
        assert!(shutdown.is_requested());
    }
}
