use crate::core::job::CompletionCause;

/// Remembers how the most recent foreground command ended. Background
/// completions never go through here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitStatusTracker {
    last_exit_code: i32,
    last_terminating_signal: Option<i32>,
}

impl Default for ExitStatusTracker {
    fn default() -> Self {
        Self {
            last_exit_code: 0,
            last_terminating_signal: None,
        }
    }
}

impl ExitStatusTracker {
    pub fn record(&mut self, cause: CompletionCause) {
        match cause {
            CompletionCause::ExitCode(code) => {
                self.last_exit_code = code;
                self.last_terminating_signal = None;
            }
            CompletionCause::TerminatingSignal(signal) => {
                self.last_terminating_signal = Some(signal);
            }
        }
    }

    pub fn last(&self) -> CompletionCause {
        match self.last_terminating_signal {
            Some(signal) => CompletionCause::TerminatingSignal(signal),
            None => CompletionCause::ExitCode(self.last_exit_code),
        }
    }

    /// The line printed by the `status` builtin.
    pub fn render(&self) -> String {
        self.last().to_string()
    }
}
