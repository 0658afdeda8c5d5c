//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.
#![allow(deprecated)]

use error_chain::error_chain;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Nix(::nix::Error);
        Docopt(::docopt::Error);
    }

    errors {
        Syntax(line: String) {
            description("syntax error")
            display("syntax error: {}", line)
        }

        BuiltinCommand(message: String, code: i32) {
            description("builtin command error")
            display("{}", message)
        }

        JobLimitReached(limit: usize) {
            description("too many background jobs")
            display("too many background jobs (limit is {})", limit)
        }

        ForkFailed {
            description("failed to create a new process")
            display("failed to create a new process")
        }

        SignalSetup(signal: String) {
            description("failed to install signal handler")
            display("failed to install handler for {}", signal)
        }
    }
}

impl Error {
    pub(crate) fn syntax<T: AsRef<str>>(line: T) -> Error {
        Error::from(ErrorKind::Syntax(line.as_ref().to_string()))
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        Error::from(ErrorKind::BuiltinCommand(message.as_ref().to_string(), code))
    }

    /// User-input faults are reported and the loop carries on; everything
    /// else escaping the dispatcher ends the interpreter.
    pub fn is_recoverable(&self) -> bool {
        match *self.kind() {
            ErrorKind::Syntax(_)
            | ErrorKind::BuiltinCommand(..)
            | ErrorKind::JobLimitReached(_)
            | ErrorKind::Docopt(_) => true,
            _ => false,
        }
    }
}
