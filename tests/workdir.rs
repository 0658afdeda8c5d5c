use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{self, Child, ChildStdin, ChildStdout, Command, Stdio};
use std::str::FromStr;

use tempdir::TempDir;

/// WorkDir represents a directory in which tests are run.
///
/// Every shell started from here gets its own process group, since a
/// terminated shell signals its whole group on the way out.
#[derive(Debug)]
pub struct WorkDir {
    /// The directory in which the test will run.
    dir: TempDir,
}

impl WorkDir {
    /// Creates a fresh temporary directory named after the test.
    pub fn new(name: &str) -> WorkDir {
        WorkDir {
            dir: TempDir::new(&format!("tinysh-{}", name)).expect("unable to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` inside the working directory.
    pub fn create<P: AsRef<Path>>(&self, name: P, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("unable to write test file");
        path
    }

    pub fn read<P: AsRef<Path>>(&self, name: P) -> String {
        fs::read_to_string(self.path().join(name)).expect("unable to read test file")
    }

    /// Builds a new command to run in this working directory, logging next
    /// to the test's files.
    pub fn command<I, S>(&self, args: I) -> process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        use std::os::unix::process::CommandExt;

        let mut cmd = Command::new(Self::bin());
        cmd.current_dir(self.path());
        cmd.arg(format!("--log={}", self.path().join("tinysh.log").display()));
        cmd.args(args);
        cmd.process_group(0);
        cmd
    }

    /// Returns path to executable.
    fn bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_tinysh"))
    }

    /// Feeds `script` to a non-interactive shell on stdin and collects its
    /// output once it exits.
    pub fn pipe(&self, script: &str) -> process::Output {
        let mut child = self
            .command(Vec::<&str>::new())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("unable to spawn tinysh");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(script.as_bytes())
            .expect("unable to write script");
        child.wait_with_output().expect("tinysh did not run")
    }

    /// Starts a shell on piped stdin/stdout that stays open until the
    /// session is finished, so signals can be sent in between lines.
    pub fn session(&self) -> Session {
        let mut child = self
            .command(Vec::<&str>::new())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("unable to spawn tinysh");
        let stdin = child.stdin.take();
        let stdout = BufReader::new(child.stdout.take().expect("stdout is piped"));
        Session {
            child,
            stdin,
            stdout,
        }
    }

    /// Executes the command and collects its stdout.
    ///
    /// Panics if the return type cannot be created from a string.
    pub fn stdout<E: fmt::Debug, T: FromStr<Err = E>>(&self, cmd: &mut process::Command) -> T {
        let o = self.output(cmd);
        let stdout = String::from_utf8_lossy(&o.stdout);
        match stdout.parse() {
            Ok(t) => t,
            Err(err) => {
                panic!("could not convert from string: {:?}\n\n{}", err, stdout);
            }
        }
    }

    /// Executes the command and collects its output.
    ///
    /// Panic if the command fails.
    pub fn output(&self, cmd: &mut process::Command) -> process::Output {
        let o = cmd.output().unwrap();
        if !o.status.success() {
            panic!(
                "\n\n==========\n\
                 command failed but expected success!\
                 \n\ncommand: {:?}\
                 \ncwd: {}\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n==========\n",
                cmd,
                self.path().display(),
                o.status,
                String::from_utf8_lossy(&o.stdout),
                String::from_utf8_lossy(&o.stderr)
            );
        }
        o
    }
}

/// A running shell whose input is written line by line.
#[derive(Debug)]
pub struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn send_line(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        writeln!(stdin, "{}", line).expect("unable to write to tinysh");
        stdin.flush().expect("unable to flush tinysh stdin");
    }

    /// Writes `text` without a trailing newline.
    pub fn send_partial(&mut self, text: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        write!(stdin, "{}", text).expect("unable to write to tinysh");
        stdin.flush().expect("unable to flush tinysh stdin");
    }

    /// Reads stdout up to and including the next line ending with
    /// `expected`, returning everything read.
    pub fn wait_for_line(&mut self, expected: &str) -> String {
        let mut seen = String::new();
        loop {
            let mut line = String::new();
            let n = self.stdout.read_line(&mut line).expect("unable to read tinysh stdout");
            assert!(n > 0, "tinysh closed stdout before printing {:?}:\n{}", expected, seen);
            seen.push_str(&line);
            if line.trim_end().ends_with(expected) {
                return seen;
            }
        }
    }

    /// Closes stdin and collects the rest of the output.
    pub fn finish(mut self) -> (process::ExitStatus, String, String) {
        use std::io::Read;

        drop(self.stdin.take());
        let mut stdout = String::new();
        self.stdout
            .read_to_string(&mut stdout)
            .expect("unable to read tinysh stdout");
        let output = self.child.wait_with_output().expect("tinysh did not run");
        (
            output.status,
            stdout,
            String::from_utf8_lossy(&output.stderr).into_owned(),
        )
    }
}
