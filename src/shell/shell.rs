//! Tinysh - Shell Module
//!
//! The Shell drives the read-eval loop: it reads a line, turns it into a
//! `CommandSpec`, runs builtins itself, and hands everything else to the
//! process launcher. It also owns the background job table and the state the
//! control signals act on.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::process;

use log::{debug, error, info};

use crate::core::command::CommandSpec;
use crate::editor::{Editor, ReadOutcome};
use crate::errors::Result;
use crate::shell::{
    builtins, execute_command,
    exit_status::ExitStatusTracker,
    job_control::JobTable,
    signals::{self, HandlerSet},
    ShellConfig, PROMPT,
};

const ENTER_FOREGROUND_ONLY_MESSAGE: &str = "Entering foreground-only mode (& is now ignored)";
const EXIT_FOREGROUND_ONLY_MESSAGE: &str = "Exiting foreground-only mode";

/// State the control signals and the dispatcher act on between iterations.
#[derive(Debug, Default)]
pub struct InterpreterState {
    foreground_only_mode: bool,
    exit_status: ExitStatusTracker,
    signal_caught_this_iteration: bool,
}

impl InterpreterState {
    pub fn foreground_only_mode(&self) -> bool {
        self.foreground_only_mode
    }

    /// Flips foreground-only mode and returns the line announcing it.
    pub fn toggle_foreground_only_mode(&mut self) -> &'static str {
        self.foreground_only_mode = !self.foreground_only_mode;
        if self.foreground_only_mode {
            ENTER_FOREGROUND_ONLY_MESSAGE
        } else {
            EXIT_FOREGROUND_ONLY_MESSAGE
        }
    }

    pub fn exit_status(&self) -> &ExitStatusTracker {
        &self.exit_status
    }

}

/// Tinysh Shell
pub struct Shell {
    jobs: JobTable,
    state: InterpreterState,
    config: ShellConfig,
    /// Substituted for `$$`.
    pid: u32,
}

impl Shell {
    /// Installs the interactive signal handlers and sets up an empty job
    /// table. Failing to install a handler is fatal.
    pub fn new(config: ShellConfig) -> Result<Self> {
        HandlerSet::Interactive.install()?;

        let shell = Self {
            jobs: JobTable::with_capacity(config.job_capacity()),
            state: InterpreterState::default(),
            config,
            pid: process::id(),
        };

        info!("tinysh started up");
        Ok(shell)
    }

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// Parses and runs a single line. User-input faults come back as
    /// recoverable errors; see `Error::is_recoverable`.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let command =
            match CommandSpec::parse(input, self.pid, !self.state.foreground_only_mode)? {
                Some(command) => command,
                None => return Ok(()),
            };
        debug!("{:?}", command);

        if builtins::is_builtin(command.program()) {
            builtins::run(self, command.program(), command.args(), &mut io::stdout())
        } else {
            execute_command::run_external_command(
                &command,
                &mut self.jobs,
                &mut self.state.exit_status,
                &mut io::stdout(),
            )
        }
    }

    /// Runs each line of the file at `path` in order.
    pub fn execute_commands_from_file(&mut self, path: &Path) -> Result<()> {
        let mut editor = Editor::from_file(File::open(path)?);
        self.execute_from_editor(&mut editor, None)
    }

    /// Reads and runs commands from standard input until end of input.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        let prompt = if self.config.is_interactive() {
            Some(PROMPT)
        } else {
            None
        };
        let mut editor = Editor::stdin();
        self.execute_from_editor(&mut editor, prompt)
    }

    fn execute_from_editor(&mut self, editor: &mut Editor, prompt: Option<&str>) -> Result<()> {
        loop {
            self.poll_signals();
            self.state.signal_caught_this_iteration = false;
            self.jobs.do_job_notification(&mut io::stdout())?;

            let outcome = editor.readline(prompt)?;
            self.poll_signals();

            // A flag raised before the read started does not abandon a line
            // that was read in full.
            match outcome {
                ReadOutcome::Line(line) => self.execute_reporting_recoverable(&line)?,
                ReadOutcome::Interrupted => {
                    debug!("read interrupted, restarting");
                    if self.state.signal_caught_this_iteration && self.config.is_interactive() {
                        println!();
                    }
                }
                ReadOutcome::Eof => return Ok(()),
            }
        }
    }

    /// Terminates outstanding background jobs and exits the process with
    /// `code`, or with the last foreground status when `code` is `None`.
    pub fn exit(&mut self, code: Option<i32>) -> ! {
        self.jobs.terminate_all();

        let code = code.unwrap_or_else(|| self.state.exit_status.last().code());
        info!("tinysh has shut down with status {}", code);
        process::exit(code);
    }

    fn execute_reporting_recoverable(&mut self, line: &str) -> Result<()> {
        match self.execute_command_string(line) {
            Err(ref e) if e.is_recoverable() => {
                debug!("recoverable error for {:?}: {}", line, e);
                eprintln!("tinysh: {}", e);
                Ok(())
            }
            Err(e) => {
                error!("fatal error for {:?}: {}", line, e);
                Err(e)
            }
            Ok(()) => Ok(()),
        }
    }

    /// Folds whatever the signal handlers recorded into the shell state.
    fn poll_signals(&mut self) {
        if signals::take_signal_caught() {
            self.state.signal_caught_this_iteration = true;
        }
        for _ in 0..signals::take_stop_toggles() {
            let message = self.state.toggle_foreground_only_mode();
            info!("{}", message);
            println!("{}", message);
        }
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}\n{:?}\n{:?}",
            self.config, self.state, self.jobs
        )
    }
}
