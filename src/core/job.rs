use std::fmt;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

use crate::util;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessId(i32);

impl ProcessId {
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl From<i32> for ProcessId {
    fn from(value: i32) -> Self {
        ProcessId(value)
    }
}

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value as i32)
    }
}

impl From<Pid> for ProcessId {
    fn from(value: Pid) -> Self {
        ProcessId(value.as_raw())
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a child process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionCause {
    ExitCode(i32),
    TerminatingSignal(i32),
}

impl CompletionCause {
    /// Extracts the termination cause from a `waitpid` result, if the
    /// process has actually terminated.
    pub fn from_wait_status(status: &WaitStatus) -> Option<(ProcessId, CompletionCause)> {
        match *status {
            WaitStatus::Exited(pid, code) => Some((pid.into(), CompletionCause::ExitCode(code))),
            WaitStatus::Signaled(pid, signal, _) => Some((
                pid.into(),
                CompletionCause::TerminatingSignal(signal as i32),
            )),
            _ => None,
        }
    }

    /// The conventional numeric status: the exit code, or 128 + signal.
    pub fn code(self) -> i32 {
        match self {
            CompletionCause::ExitCode(code) => code,
            CompletionCause::TerminatingSignal(signal) => util::status_code_from_signal(signal),
        }
    }
}

impl fmt::Display for CompletionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CompletionCause::ExitCode(code) => write!(f, "exit value {}", code),
            CompletionCause::TerminatingSignal(signal) => {
                write!(f, "terminated by signal {}", signal)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Running,
    Completed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            JobState::Running => write!(f, "Running"),
            JobState::Completed => write!(f, "Completed"),
        }
    }
}

/// A detached background process.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pid: ProcessId,
    state: JobState,
    completion_cause: Option<CompletionCause>,
}

impl Job {
    pub fn new(pid: ProcessId) -> Self {
        Self {
            pid,
            state: JobState::Running,
            completion_cause: None,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn completion_cause(&self) -> Option<CompletionCause> {
        self.completion_cause
    }

    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }

    pub fn mark_completed(self, cause: CompletionCause) -> Self {
        Self {
            state: JobState::Completed,
            completion_cause: Some(cause),
            ..self
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.completion_cause {
            Some(cause) => write!(f, "Background process {} has completed: {}", self.pid, cause),
            None => write!(f, "Background process {} is {}", self.pid, self.state),
        }
    }
}
