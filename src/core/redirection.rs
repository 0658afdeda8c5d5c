//! Input/output redirection.
//!
//! Redirection happens in two halves. The shell strips `< path` and `> path`
//! out of the argument list before it creates a process, so a malformed
//! command never forks. The child then opens the paths and wires them onto
//! its standard streams right before replacing its image; a file that cannot
//! be opened only takes down the child.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use log::debug;
use nix::libc;
use nix::unistd;

use crate::errors::{Error, Result};

const INPUT_SYMBOL: &str = "<";
const OUTPUT_SYMBOL: &str = ">";
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Redirection targets found in a command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Redirects {
    pub stdin: Option<String>,
    pub stdout: Option<String>,
}

impl Redirects {
    pub fn is_empty(&self) -> bool {
        self.stdin.is_none() && self.stdout.is_none()
    }
}

/// Removes every `< path` and `> path` pair from `words`, in place, keeping
/// the order of the remaining words.
///
/// A symbol with nothing after it, or a second redirection of the same
/// stream, is a syntax error and leaves `words` in an unspecified state.
pub fn extract_redirects(words: &mut Vec<String>) -> Result<Redirects> {
    let mut redirects = Redirects::default();
    let mut i = 0;
    while i < words.len() {
        let slot = match words[i].as_str() {
            INPUT_SYMBOL => &mut redirects.stdin,
            OUTPUT_SYMBOL => &mut redirects.stdout,
            _ => {
                i += 1;
                continue;
            }
        };

        if i + 1 == words.len() {
            return Err(Error::syntax(format!("expected a path after '{}'", words[i])));
        }
        if slot.is_some() {
            return Err(Error::syntax(format!(
                "more than one '{}' redirection",
                words[i]
            )));
        }

        let mut pair = words.drain(i..i + 2);
        pair.next();
        *slot = pair.next();
    }

    Ok(redirects)
}

/// Descriptors opened for one launch attempt. Dropping the request closes
/// them; both are opened close-on-exec, so only the copies placed on the
/// standard streams by `apply` survive into the new program image.
#[derive(Debug, Default)]
pub struct RedirectionRequest {
    source: Option<File>,
    destination: Option<File>,
}

impl RedirectionRequest {
    pub fn open(redirects: &Redirects) -> Result<Self> {
        let source = match redirects.stdin {
            Some(ref path) => Some(File::open(path).map_err(|e| {
                Error::from(format!("cannot open {} for input: {}", path, e))
            })?),
            None => None,
        };

        let destination = match redirects.stdout {
            Some(ref path) => Some(
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(OUTPUT_FILE_MODE)
                    .open(path)
                    .map_err(|e| Error::from(format!("cannot open {} for output: {}", path, e)))?,
            ),
            None => None,
        };

        Ok(Self {
            source,
            destination,
        })
    }

    /// Points standard input/output of the calling process at the opened
    /// files, then closes the originals. Only meant to run in a freshly
    /// created child.
    pub fn apply(self) -> Result<()> {
        if let Some(ref source) = self.source {
            debug!("redirecting stdin from fd {}", source.as_raw_fd());
            unistd::dup2(source.as_raw_fd(), libc::STDIN_FILENO)?;
        }
        if let Some(ref destination) = self.destination {
            debug!("redirecting stdout to fd {}", destination.as_raw_fd());
            unistd::dup2(destination.as_raw_fd(), libc::STDOUT_FILENO)?;
        }

        Ok(())
    }
}
