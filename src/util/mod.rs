use std::io;
use std::os::unix::prelude::*;

use nix::unistd;

/// The descriptor the shell reads commands from when none is given.
pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}

/// Is the shell's standard input attached to a terminal?
pub fn isatty() -> bool {
    let temp_result = unistd::isatty(get_terminal());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

/// Exit code a shell reports for `status`: the program's own code, or
/// 128 plus the number of the signal that killed it.
pub fn status_code_from_signal(signal: i32) -> i32 {
    128 + signal
}
