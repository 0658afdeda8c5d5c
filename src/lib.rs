//! tinysh - a tiny interactive shell
//!
//! Runs external programs in the foreground or background, redirects their
//! standard streams, and keeps responding to the interrupt, terminate, and
//! stop signals the way an interactive shell should.

#![deny(missing_debug_implementations, trivial_casts, unused_import_braces)]

/// Logs `$result` if it is an `Err`, otherwise does nothing.
#[macro_export]
macro_rules! log_if_err {
    ($result:expr) => {
        if let Err(e) = $result {
            log::error!("{}", e);
        }
    };
    ($result:expr, $fmt:expr) => {
        if let Err(e) = $result {
            log::error!(concat!($fmt, ": {}"), e);
        }
    };
    ($result:expr, $fmt:expr, $($arg:tt)*) => {
        if let Err(e) = $result {
            log::error!(concat!($fmt, ": {}"), $($arg)*, e);
        }
    };
}

pub mod core;
pub mod editor;
pub mod errors;
pub mod shell;
pub mod util;

pub use crate::shell::{Shell, ShellConfig};
