use statusboard::input::{ResizeFlag, ShutdownFlag};
use statusboard::view::{Highlight, MemorySurface};
use statusboard::{Config, LogSource, PollLoop, StreamKind};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

struct Board {
    _dir: tempfile::TempDir,
    status: PathBuf,
    error_log: PathBuf,
    resize: ResizeFlag,
    poll_loop: PollLoop<MemorySurface>,
}

impl Board {
    fn new(config: Config) -> Board {
        let dir = tempfile::tempdir().unwrap();
        let status = dir.path().join("status.txt");
        let error_log = dir.path().join("errorlog.txt");
        let resize = ResizeFlag::new();
        let mut poll_loop = PollLoop::new(
            &config,
            MemorySurface::new(80, 16),
            resize.clone(),
            ShutdownFlag::new(),
        )
        .unwrap();
        poll_loop.add_source(StreamKind::Status, LogSource::open(&status).unwrap());
        poll_loop.add_source(
            StreamKind::SystemLog,
            LogSource::unavailable(dir.path().join("missing/systemlog.txt")),
        );
        poll_loop.add_source(StreamKind::ErrorLog, LogSource::open(&error_log).unwrap());
        Board {
            _dir: dir,
            status,
            error_log,
            resize,
            poll_loop,
        }
    }

    /// Turns the loop until `cycles` cycles have completed.
    fn run_until(&mut self, cycles: u64) {
        let mut turns = 0;
        while self.poll_loop.store().cycles() < cycles {
            self.poll_loop.turn().unwrap();
            turns += 1;
            assert!(turns < 1000, "cycle {} never completed", cycles);
        }
    }

    fn surface(&self) -> &MemorySurface {
        self.poll_loop.surface()
    }
}

fn fast() -> Config {
    Config {
        poll_timeout_ms: 1,
        ..Config::default()
    }
}

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

const DETECTOR_CYCLE: &str = "NSS 2010-08-07 00:19:34 UTC Status\n\
chan1x (beam1) Run\n\
chan2x (beam1) Offline\n\
dx1001 (beam1) 2010-08-07 00:19:34 UTC Act 2735: Init Sky: 8424.914 MHz Chan: 13\n\
dx1002 (beam1) 2010-08-07 00:19:34 UTC Act 2735: Data Coll Sky: 8430.5 MHz Chan: 7\n\
dx1003 (beam2) Offline No Activities\n\
tscope ok\n\
junk line that matches nothing\n\
====================================\n";

#[test]
fn full_cycle_is_rendered() {
    let mut board = Board::new(fast());
    append(&board.status, DETECTOR_CYCLE);
    append(&board.error_log, "an error the board ignores\n");
    board.run_until(1);

    let store = board.poll_loop.store();
    assert_eq!(store.activity(), "2735");
    assert_eq!(store.record_count(), 6);
    assert_eq!(store.date(), "2010-08-07");
    assert_eq!(board.poll_loop.lines_read(StreamKind::ErrorLog), 1);
    assert_eq!(board.poll_loop.lines_read(StreamKind::SystemLog), 0);

    let surface = board.surface();
    assert!(surface.row_text(0).starts_with("00:19:34 UTC"));
    assert!(surface.row_text(0).contains("SonATA System Status"));
    assert!(surface.row_text(0).ends_with("Page 1 of 1"));
    assert_eq!(surface.row_text(1), "Activity: 2735");

    assert_eq!(surface.row_text(3), "chan1x   (beam1) Run");
    assert_eq!(surface.highlight_at(3), Some(Highlight::Running));
    assert_eq!(surface.highlight_at(4), Some(Highlight::Offline));
    assert_eq!(
        surface.row_text(5),
        "dx1001   (beam1) 2010-08-07 00:19:34 Act 2735: Init Sky: 8424.914 MHz Chan: 13"
            .chars()
            .take(80)
            .collect::<String>()
    );
    assert_eq!(surface.highlight_at(8), Some(Highlight::Neutral));
    assert_eq!(surface.row_text(9), "");

    assert_eq!(surface.row_text(14), "Total Channelizers=2, Running=1");
    let last = surface.row_text(15);
    assert!(last.starts_with("Total Dxs=3, Offline=1, Idle=1, Data Coll=1"));
    assert!(last.ends_with("8424.9140 to 8430.5000 MHz"));
}

#[test]
fn next_cycle_replaces_the_last() {
    let mut board = Board::new(fast());
    append(&board.status, DETECTOR_CYCLE);
    board.run_until(1);
    let drawn = board.surface().lines_drawn;

    append(
        &board.status,
        "NSS 2010-08-07 00:19:35 UTC Status\n\
         chan1x (beam1) Run\n\
         chan2x (beam1) Run\n\
         ====================================\n",
    );
    board.run_until(2);

    let surface = board.surface();
    assert_eq!(surface.row_text(4), "chan2x   (beam1) Run");
    assert_eq!(surface.highlight_at(4), Some(Highlight::Running));
    assert_eq!(surface.row_text(5), "");
    assert_eq!(surface.row_text(14), "Total Channelizers=2, Running=2");
    assert_eq!(surface.row_text(15), "Total Dxs=0");
    // Row 3 did not change and was not redrawn.
    assert!(surface.lines_drawn - drawn < 16);
}

#[test]
fn slow_writer_still_refreshes() {
    let mut board = Board::new(Config {
        poll_timeout_ms: 1,
        cycle_interval_ms: 200,
        ..Config::default()
    });
    append(&board.status, "NSS 2010-08-07 00:19:34 UTC Status\nbeam1 tracking\n");
    for _ in 0..4 {
        board.poll_loop.turn().unwrap();
    }
    assert_eq!(board.poll_loop.store().cycles(), 0);

    std::thread::sleep(Duration::from_millis(250));
    board.run_until(1);
    assert_eq!(board.surface().row_text(3), "beam1    tracking");
    assert_eq!(board.poll_loop.context().lines_since_boundary, 0);
}

#[test]
fn paging_and_resize() {
    let mut board = Board::new(fast());
    let mut text = String::from("NSS 2010-08-07 00:19:34 UTC Status\n");
    for i in 0..25 {
        text.push_str(&format!("array{} up\n", i));
    }
    text.push_str("=========\n");
    append(&board.status, &text);
    board.run_until(1);
    assert!(board.surface().row_text(0).ends_with("Page 1 of 3"));
    assert!(board.surface().row_text(1).ends_with("9=Next"));

    let (tx, rx) = crossbeam::channel::unbounded();
    board.poll_loop.attach_keys(rx);
    tx.send('9').unwrap();
    tx.send('9').unwrap();
    board.poll_loop.turn().unwrap();
    assert_eq!(board.poll_loop.view().page(), 3);
    assert_eq!(board.surface().row_text(3), "array20  up");
    assert_eq!(board.surface().row_text(8), "");

    // Taller terminal: everything fits on one page.
    board.poll_loop.surface_mut().set_size(80, 40);
    board.resize.notify(80, 40);
    board.poll_loop.turn().unwrap();
    assert_eq!(board.poll_loop.view().page(), 1);
    assert!(board.surface().row_text(0).ends_with("Page 1 of 1"));
    assert_eq!(board.surface().row_text(27), "array24  up");
    assert_eq!(board.surface().row_text(39).trim_end(), "Total Dxs=0");
}
