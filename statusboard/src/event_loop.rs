//! Poll loop
//!
//! The single thread of control of the dashboard. Each turn:
//! - waits on a `mio::Poll` for at most the configured timeout. The only
//!   registered source is a `mio::Waker`, poked by the keyboard thread,
//!   because regular files cannot be registered with epoll/kqueue: like
//!   `select(2)` would, every log source is treated as always readable and
//!   simply asked for a line after each wake. When the previous turn did
//!   read something the wait is skipped, so a backlog drains at full speed;
//! - takes at most one line from every source. Lines from the status
//!   stream go to the `RecordStore`; the system and error logs are
//!   followed but their lines are not interpreted yet;
//! - synthesizes a boundary if status lines arrived but no boundary did
//!   within the cycle interval, so the view still refreshes when the
//!   writer is slow to terminate a cycle;
//! - forwards pending key presses to the view;
//! - repaints when a cycle completed, a paging key was pressed, or the
//!   terminal was resized.
//!
//! Nothing in the loop blocks except the bounded wait.

use crate::config::Config;
use crate::error::Result;
use crate::input::{ResizeFlag, ShutdownFlag};
use crate::status::{category, RecordStore};
use crate::tail::{LogSource, ReadError};
use crate::view::{PaginatedView, RenderStats, Surface};
use chrono::{NaiveDateTime, Utc};
use crossbeam::channel;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Token of the waker used by input threads.
const WAKE_TOKEN: mio::Token = mio::Token(0);

/// Which stream a source carries, and so what its lines are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// The system status file, parsed into the record store.
    Status,
    /// The system log. Followed, not parsed yet.
    SystemLog,
    /// The error log. Followed, not parsed yet.
    ErrorLog,
}

/// State owned by the loop and shared with its collaborators.
pub struct LoopContext {
    /// Status lines dispatched since the last completed cycle.
    pub lines_since_boundary: usize,
    /// When the first of those lines arrived.
    pub pending_since: Option<Instant>,
    pub last_cycle: Instant,
    /// System marker time of the last completed cycle.
    pub last_marker: Option<NaiveDateTime>,
    pub resize: ResizeFlag,
    pub shutdown: ShutdownFlag,
}

impl LoopContext {
    pub fn new(resize: ResizeFlag, shutdown: ShutdownFlag) -> LoopContext {
        LoopContext {
            lines_since_boundary: 0,
            pending_since: None,
            last_cycle: Instant::now(),
            last_marker: None,
            resize,
            shutdown,
        }
    }

    /// Whether a boundary should be synthesized now: status lines are
    /// pending and the oldest of them has waited at least `interval`.
    /// Idle time before that line does not count.
    pub fn cycle_overdue(&self, interval: Duration) -> bool {
        self.lines_since_boundary > 0
            && self
                .pending_since
                .map_or(false, |since| since.elapsed() >= interval)
    }

    fn line_pending(&mut self) {
        if self.lines_since_boundary == 0 {
            self.pending_since = Some(Instant::now());
        }
        self.lines_since_boundary += 1;
    }

    fn cycle_completed(&mut self, marker: Option<NaiveDateTime>) {
        self.lines_since_boundary = 0;
        self.pending_since = None;
        self.last_cycle = Instant::now();
        if let Some(marker) = marker {
            let lag = Utc::now().naive_utc() - marker;
            debug!("Cycle marked {} closed, {}s behind", marker, lag.num_seconds());
        }
        self.last_marker = marker;
    }
}

struct Feed {
    kind: StreamKind,
    source: LogSource,
    /// Lines taken from this source so far.
    lines: u64,
}

/// Summary of one loop turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Lines read across all sources.
    pub lines: usize,
    /// Cycles completed, synthesized ones included.
    pub cycles: usize,
    /// Paging keys accepted.
    pub keys: usize,
    pub repaints: usize,
    pub synthesized: bool,
}

pub struct PollLoop<S: Surface> {
    poll: mio::Poll,
    events: mio::Events,
    waker: Arc<mio::Waker>,
    feeds: Vec<Feed>,
    store: RecordStore,
    view: PaginatedView,
    surface: S,
    keys: channel::Receiver<char>,
    ctx: LoopContext,
    poll_timeout: Duration,
    cycle_interval: Duration,
    /// Set when the previous turn read something.
    busy: bool,
}

impl<S: Surface> PollLoop<S> {
    pub fn new(config: &Config, surface: S, resize: ResizeFlag, shutdown: ShutdownFlag) -> Result<Self> {
        let poll = mio::Poll::new()?;
        let waker = Arc::new(mio::Waker::new(poll.registry(), WAKE_TOKEN)?);
        Ok(PollLoop {
            poll,
            events: mio::Events::with_capacity(8),
            waker,
            feeds: Vec::new(),
            store: RecordStore::new(),
            view: PaginatedView::new(config, resize.clone()),
            surface,
            keys: channel::never(),
            ctx: LoopContext::new(resize, shutdown),
            poll_timeout: config.poll_timeout(),
            cycle_interval: config.cycle_interval(),
            busy: false,
        })
    }

    /// Waker to hand to threads feeding the loop.
    pub fn waker(&self) -> Arc<mio::Waker> {
        Arc::clone(&self.waker)
    }

    /// Sets the channel key presses arrive on.
    pub fn attach_keys(&mut self, keys: channel::Receiver<char>) {
        self.keys = keys;
    }

    pub fn add_source(&mut self, kind: StreamKind, source: LogSource) {
        info!("Following {:?} stream {}", kind, source.path().display());
        self.feeds.push(Feed {
            kind,
            source,
            lines: 0,
        });
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn view(&self) -> &PaginatedView {
        &self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn context(&self) -> &LoopContext {
        &self.ctx
    }

    /// Lines taken so far from the first source of the given kind.
    pub fn lines_read(&self, kind: StreamKind) -> u64 {
        self.feeds
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.lines)
            .unwrap_or(0)
    }

    /// Runs until a shutdown is requested. Paints once up front so the
    /// frame is visible before the first cycle arrives.
    pub fn run(&mut self) -> Result<()> {
        self.repaint()?;
        while !self.ctx.shutdown.is_requested() {
            self.turn()?;
        }
        info!("Shutdown requested, leaving poll loop");
        Ok(())
    }

    /// Performs one wait and everything that follows it.
    pub fn turn(&mut self) -> Result<TurnOutcome> {
        let timeout = if self.busy {
            Duration::ZERO
        } else {
            self.poll_timeout
        };
        if let Err(e) = self.poll.poll(&mut self.events, Some(timeout)) {
            // A signal (resize, interrupt) may cut the wait short.
            if e.kind() != io::ErrorKind::Interrupted {
                return Err(e.into());
            }
        }
        for event in self.events.iter() {
            if event.token() != WAKE_TOKEN {
                warn!("Unexpected poll token {:?}", event.token());
            }
        }

        let mut outcome = TurnOutcome::default();
        let mut repaint = false;

        for i in 0..self.feeds.len() {
            let feed = &mut self.feeds[i];
            let line = match feed.source.next_line() {
                Ok(line) => line,
                Err(ReadError::NotReady) | Err(ReadError::Unavailable) => continue,
                Err(ReadError::IO(e)) => {
                    warn!("Reading {} failed: {}", feed.source.path().display(), e);
                    continue;
                }
            };
            feed.lines += 1;
            outcome.lines += 1;
            let kind = feed.kind;
            if self.dispatch(kind, &line) {
                outcome.cycles += 1;
                repaint = true;
            }
        }
        self.busy = outcome.lines > 0;

        if self.ctx.cycle_overdue(self.cycle_interval) {
            debug!(
                "No boundary after {} status lines, synthesizing one",
                self.ctx.lines_since_boundary
            );
            outcome.synthesized = true;
            if self.dispatch(StreamKind::Status, category::SYNTHETIC_BOUNDARY) {
                outcome.cycles += 1;
                repaint = true;
            }
        }

        if repaint || self.ctx.resize.is_pending() {
            self.repaint()?;
            outcome.repaints += 1;
        }

        while let Ok(key) = self.keys.try_recv() {
            if self.view.handle_key(key, self.store.snapshot()) {
                outcome.keys += 1;
                self.repaint()?;
                outcome.repaints += 1;
            }
        }
        Ok(outcome)
    }

    /// Hands a line to whatever consumes its stream. Returns true when it
    /// completed a status cycle.
    fn dispatch(&mut self, kind: StreamKind, line: &str) -> bool {
        match kind {
            StreamKind::Status => {
                self.ctx.line_pending();
                let completed = self.store.classify_and_add(line);
                if completed {
                    self.ctx.cycle_completed(self.store.marker_time());
                }
                completed
            }
            StreamKind::SystemLog | StreamKind::ErrorLog => {
                trace!("{:?}: {}", kind, line);
                false
            }
        }
    }

    fn repaint(&mut self) -> Result<RenderStats> {
        Ok(self.view.render(self.store.snapshot(), &mut self.surface)?)
    }
}
