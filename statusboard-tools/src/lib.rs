use getopts::Options;
use statusboard::{Error, Result};
use std::path::PathBuf;

/// Options common to the status board tools.
pub fn board_opts() -> Options {
    let mut opts = Options::new();
    opts.optflag("h", "help", "Show help");
    opts.optopt(
        "c",
        "config",
        "YAML file overriding timing, paging keys and title",
        "file",
    );
    opts
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub status: PathBuf,
    pub system_log: PathBuf,
    pub error_log: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub help: bool,
}

pub fn usage(opts: &Options, program: &str) -> String {
    let brief = format!(
        "Usage: {program} [options] <status-file> <system-log> [error-log]\n\n\
         Follows the system status file and shows the latest cycle, a page at a time."
    );
    opts.usage(&brief)
}

/// Parses `args`, which do not include the program name. Fails with a
/// message when the arguments are malformed or the two required files are
/// missing, unless help was requested. Positionals past the third are
/// ignored.
pub fn board_parseopts(opts: &Options, args: &[String]) -> Result<Invocation> {
    let matches = opts.parse(args).map_err(|f| Error::Usage(f.to_string()))?;
    let help = matches.opt_present("help");
    let config = matches.opt_str("c").map(PathBuf::from);
    let mut free = matches.free.into_iter().map(PathBuf::from);
    let (status, system_log) = match (free.next(), free.next()) {
        (Some(status), Some(system_log)) => (status, system_log),
        _ if help => (PathBuf::new(), PathBuf::new()),
        _ => return Err(Error::Usage("a status file and a system log are required".to_string())),
    };
    let error_log = free.next();
    Ok(Invocation {
        status,
        system_log,
        error_log,
        config,
        help,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_positionals() {
        let inv = board_parseopts(&board_opts(), &args(&["status.txt", "systemlog.txt"])).unwrap();
        assert_eq!(inv.status, PathBuf::from("status.txt"));
        assert_eq!(inv.system_log, PathBuf::from("systemlog.txt"));
        assert_eq!(inv.error_log, None);
        assert_eq!(inv.config, None);
        assert!(!inv.help);
    }

    #[test]
    fn error_log_and_config() {
        let inv = board_parseopts(
            &board_opts(),
            &args(&["-c", "board.yaml", "status.txt", "systemlog.txt", "errorlog.txt"]),
        )
        .unwrap();
        assert_eq!(inv.error_log, Some(PathBuf::from("errorlog.txt")));
        assert_eq!(inv.config, Some(PathBuf::from("board.yaml")));
    }

    #[test]
    fn missing_positionals_fail() {
        assert!(board_parseopts(&board_opts(), &args(&["status.txt"])).is_err());
        assert!(board_parseopts(&board_opts(), &args(&[])).is_err());
        assert!(board_parseopts(&board_opts(), &args(&["--bogus", "a", "b"])).is_err());
    }

    #[test]
    fn extra_positionals_are_ignored() {
        let inv = board_parseopts(
            &board_opts(),
            &args(&["status.txt", "systemlog.txt", "errorlog.txt", "extra.txt"]),
        )
        .unwrap();
        assert_eq!(inv.error_log, Some(PathBuf::from("errorlog.txt")));
    }

    #[test]
    fn help_needs_no_files() {
        let inv = board_parseopts(&board_opts(), &args(&["-h"])).unwrap();
        assert!(inv.help);
    }

    #[test]
    fn usage_names_the_program() {
        let text = usage(&board_opts(), "statusboard");
        assert!(text.starts_with("Usage: statusboard [options]"));
        assert!(text.contains("--config"));
    }
}
