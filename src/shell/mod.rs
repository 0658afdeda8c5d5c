pub mod builtins;
pub mod execute_command;
pub mod exit_status;
pub mod job_control;
#[allow(clippy::module_inception)]
pub mod shell;
pub mod signals;

pub use self::job_control::DEFAULT_JOB_CAPACITY;
pub use self::shell::{InterpreterState, Shell};

/// Prompt shown before each line in an interactive session.
pub const PROMPT: &str = ": ";

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if the prompt is written before each line is read, and if
    /// an interrupted read moves the cursor to a fresh line.
    interactive: bool,

    /// Maximum number of background jobs tracked at once.
    job_capacity: usize,
}

impl ShellConfig {
    /// Creates a config for a user typing at a terminal.
    pub fn interactive(job_capacity: usize) -> Self {
        Self {
            interactive: true,
            job_capacity,
        }
    }

    /// Creates a config for scripts, `-c` strings, and piped input: no
    /// prompt is written.
    pub fn noninteractive(job_capacity: usize) -> Self {
        Self {
            interactive: false,
            job_capacity,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn job_capacity(&self) -> usize {
        self.job_capacity
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::noninteractive(DEFAULT_JOB_CAPACITY)
    }
}
