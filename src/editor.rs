//! Line acquisition.
//!
//! Reads go straight to `read(2)` rather than through buffered std I/O: the
//! control-signal handlers are installed without `SA_RESTART`, so a signal
//! that arrives while the shell is waiting for input makes the read fail
//! with `EINTR`, and the shell gets to decide what to do before anything is
//! parsed.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::unistd;

use crate::errors::Result;
use crate::util;

const READ_CHUNK_SIZE: usize = 4096;

/// Outcome of one attempt to read a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line with its trailing newline removed.
    Line(String),
    /// A signal arrived before a full line was available; any partial line
    /// is dropped.
    Interrupted,
    /// No more input.
    Eof,
}

pub struct Editor {
    fd: RawFd,
    /// Keeps the descriptor open when reading from a script file.
    _file: Option<File>,
    pending: Vec<u8>,
    eof: bool,
}

impl Editor {
    pub fn stdin() -> Self {
        Self::with_fd(util::get_terminal(), None)
    }

    pub fn from_file(file: File) -> Self {
        Self::with_fd(file.as_raw_fd(), Some(file))
    }

    fn with_fd(fd: RawFd, file: Option<File>) -> Self {
        Self {
            fd,
            _file: file,
            pending: Vec::new(),
            eof: false,
        }
    }

    /// Writes `prompt` (if any) and reads the next line.
    pub fn readline(&mut self, prompt: Option<&str>) -> Result<ReadOutcome> {
        if let Some(prompt) = prompt {
            let mut stdout = io::stdout();
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;
        }

        loop {
            if let Some(line) = self.take_line() {
                return Ok(ReadOutcome::Line(line));
            }
            if self.eof {
                return Ok(ReadOutcome::Eof);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match unistd::read(self.fd, &mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(Errno::EINTR) => {
                    // The half-typed line is abandoned along with the read.
                    self.pending.clear();
                    return Ok(ReadOutcome::Interrupted);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Pops the next complete line off the buffer. At end of input an
    /// unterminated final line still counts.
    fn take_line(&mut self) -> Option<String> {
        let end = match self.pending.iter().position(|&b| b == b'\n') {
            Some(pos) => pos,
            None if self.eof && !self.pending.is_empty() => self.pending.len(),
            None => return None,
        };

        let mut line: Vec<u8> = self.pending.drain(..end).collect();
        if !self.pending.is_empty() {
            self.pending.remove(0);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Editor {{ fd: {}, pending: {} bytes, eof: {} }}",
            self.fd,
            self.pending.len(),
            self.eof
        )
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    fn editor_for(contents: &str) -> (TempDir, Editor) {
        let dir = TempDir::new("editor").unwrap();
        let path = dir.path().join("input");
        fs::write(&path, contents).unwrap();
        let editor = Editor::from_file(File::open(&path).unwrap());
        (dir, editor)
    }

    #[test]
    fn reads_lines_without_newlines() {
        let (_dir, mut editor) = editor_for("echo one\n\nls -la\n");
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Line("echo one".into()));
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Line("".into()));
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Line("ls -la".into()));
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Eof);
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn unterminated_last_line_is_returned() {
        let (_dir, mut editor) = editor_for("status");
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Line("status".into()));
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn empty_input_is_eof() {
        let (_dir, mut editor) = editor_for("");
        assert_eq!(editor.readline(None).unwrap(), ReadOutcome::Eof);
    }
}
