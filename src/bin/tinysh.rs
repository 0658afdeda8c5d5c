use std::path::{Path, PathBuf};
use std::process;

use docopt::Docopt;
use log::{debug, error, LevelFilter};
use nix::unistd::Pid;
use serde::Deserialize;

use tinysh::errors::{Error, Result};
use tinysh::{util, Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".tinysh_log";
const FAILURE_EXIT_STATUS: i32 = 1;

const USAGE: &str = "
tinysh.

Usage:
    tinysh [options]
    tinysh [options] -c <command>
    tinysh [options] <file>
    tinysh (-h | --help)
    tinysh --version

Options:
    -h --help           Show this screen.
    --version           Show version.
    -c                  If the -c option is present, then commands are read from the first
                            non-option argument command_string.
    --log=<path>        File to write log to, defaults to ~/.tinysh_log
    --max-jobs=<n>      Maximum number of background jobs tracked at once [default: 200].
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
    flag_max_jobs: usize,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(args.flag_log.as_deref());
    debug!("{:?}", args);

    if args.flag_version {
        println!("tinysh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin(&args);
    }
}

/// Logs to a file; every line carries the writer's pid so output from
/// forked children can be told apart from the shell's own. Logging is
/// skipped, with a warning, if the file cannot be opened.
fn init_logger(path: Option<&str>) {
    let log_path = match path.map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => {
            eprintln!("tinysh: unable to find home directory, logging disabled");
            return;
        }
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!(
                "tinysh: unable to open log file {}: {}",
                log_path.display(),
                e
            );
            return;
        }
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Pid::this(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Debug)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("tinysh: unable to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let shell_config = ShellConfig::noninteractive(args.flag_max_jobs);
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));

    let result = if let Some(ref command) = args.arg_command {
        shell.execute_command_string(command)
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(Path::new(file_path))
    } else {
        unreachable!();
    };

    exit(result, &mut shell);
}

fn execute_from_stdin(args: &Args) -> ! {
    let shell_config = if util::isatty() {
        ShellConfig::interactive(args.flag_max_jobs)
    } else {
        ShellConfig::noninteractive(args.flag_max_jobs)
    };
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));

    let result = shell.execute_from_stdin();
    exit(result, &mut shell);
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to create shell: {}", error);
    eprintln!("tinysh: {}", error);
    process::exit(FAILURE_EXIT_STATUS);
}

fn exit(result: Result<()>, shell: &mut Shell) -> ! {
    if let Err(e) = result {
        error!("exiting after error: {}", e);
        eprintln!("tinysh: {}", e);
        shell.exit(Some(FAILURE_EXIT_STATUS));
    } else {
        shell.exit(None);
    }
}
