use statusboard::input::{self, ResizeFlag, ShutdownFlag};
use statusboard::view::TerminalSurface;
use statusboard::{logging, Config, Error, LogSource, PollLoop, StreamKind};
use statusboard_tools::{board_opts, board_parseopts, usage, Invocation};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn parse_cli() -> Result<Invocation, ExitCode> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("statusboard");
    let opts = board_opts();
    match board_parseopts(&opts, args.get(1..).unwrap_or(&[])) {
        Ok(inv) if inv.help => {
            eprintln!("{}", usage(&opts, program));
            Err(ExitCode::SUCCESS)
        }
        Ok(inv) => Ok(inv),
        Err(msg) => {
            eprintln!("ERROR: {}\n{}", msg, usage(&opts, program));
            Err(ExitCode::FAILURE)
        }
    }
}

/// Opens a stream that is followed but not interpreted. A failure leaves
/// the stream unusable for the run instead of stopping the board.
fn open_auxiliary(path: &Path) -> LogSource {
    match LogSource::open(path) {
        Ok(source) => source,
        Err(e) => {
            println!(" {}", e);
            warn!("{}", e);
            LogSource::unavailable(path)
        }
    }
}

fn main() -> ExitCode {
    let inv = match parse_cli() {
        Ok(inv) => inv,
        Err(code) => return code,
    };

    let config = match &inv.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let status = match LogSource::open(&inv.status) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let system_log = open_auxiliary(&inv.system_log);
    let error_log = inv.error_log.as_deref().map(open_auxiliary);

    let shutdown = ShutdownFlag::register();
    let resize = ResizeFlag::new();

    let mut surface = match TerminalSurface::setup().map_err(|e| Error::Terminal(e.to_string())) {
        Ok(surface) => surface,
        Err(e) => {
            TerminalSurface::restore();
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        TerminalSurface::restore();
        original_hook(panic_info);
    }));

    let result = PollLoop::new(&config, &mut surface, resize.clone(), shutdown.clone()).and_then(
        |mut poll_loop| {
            poll_loop.add_source(StreamKind::Status, status);
            poll_loop.add_source(StreamKind::SystemLog, system_log);
            if let Some(source) = error_log {
                poll_loop.add_source(StreamKind::ErrorLog, source);
            }
            let keys = input::spawn_keyboard(poll_loop.waker(), resize, shutdown);
            poll_loop.attach_keys(keys);
            poll_loop.run()
        },
    );

    surface.teardown();
    match result {
        Ok(()) => {
            info!("Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
