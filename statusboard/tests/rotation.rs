use statusboard::tail::ReadError;
use statusboard::view::MemorySurface;
use statusboard::{Config, LogSource, PollLoop, StreamKind};
use statusboard::input::{ResizeFlag, ShutdownFlag};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

fn rotate(path: &Path, text: &str) {
    fs::rename(path, path.with_extension("old")).unwrap();
    let mut file = File::create(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

fn drain(source: &mut LogSource) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        match source.next_line() {
            Ok(line) => lines.push(line),
            Err(ReadError::NotReady) => return lines,
            Err(e) => panic!("unexpected read error: {}", e),
        }
    }
}

#[test]
fn survives_repeated_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.txt");
    append(&path, "written before startup\n");

    let mut source = LogSource::open(&path).unwrap();
    assert!(drain(&mut source).is_empty());

    append(&path, "first\n");
    assert_eq!(drain(&mut source), vec!["first"]);

    for round in 1..=3u64 {
        rotate(&path, &format!("round {}\n", round));
        assert_eq!(drain(&mut source), vec![format!("round {}", round)]);
        assert_eq!(source.generation(), round);
        fs::remove_file(path.with_extension("old")).unwrap();
    }

    append(&path, "after\n");
    assert_eq!(drain(&mut source), vec!["after"]);
    assert_eq!(source.generation(), 3);
}

#[test]
fn dashboard_shows_cycle_from_rotated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.txt");
    let config = Config {
        poll_timeout_ms: 1,
        ..Config::default()
    };
    let mut poll_loop = PollLoop::new(
        &config,
        MemorySurface::new(80, 16),
        ResizeFlag::new(),
        ShutdownFlag::new(),
    )
    .unwrap();
    poll_loop.add_source(StreamKind::Status, LogSource::open(&path).unwrap());

    append(
        &path,
        "NSS 2010-08-07 00:19:34 UTC Status\nchan1x UTC 00:19:34 Run\n==========\n",
    );
    while poll_loop.store().cycles() < 1 {
        poll_loop.turn().unwrap();
    }
    assert_eq!(poll_loop.surface().row_text(3), "chan1x   00:19:34 Run");

    rotate(
        &path,
        "NSS 2010-08-07 00:20:34 UTC Status\nchan2x Offline\n==========\n",
    );
    let mut turns = 0;
    while poll_loop.store().cycles() < 2 {
        poll_loop.turn().unwrap();
        turns += 1;
        assert!(turns < 100, "rotated file never read");
    }
    let surface = poll_loop.surface();
    assert!(surface.row_text(0).starts_with("00:20:34 UTC"));
    assert_eq!(surface.row_text(3), "chan2x   Offline");
    assert_eq!(surface.row_text(4), "");
    assert_eq!(surface.row_text(14), "Total Channelizers=1");
}
